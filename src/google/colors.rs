//! Google Calendar event color ids by name, Spanish and English.
const COLORS: &[(&str, &str)] = &[
    ("lavanda", "1"),
    ("lavender", "1"),
    ("verde", "2"),
    ("sage", "2"),
    ("violeta", "3"),
    ("grape", "3"),
    ("rosa", "4"),
    ("flamingo", "4"),
    ("amarillo", "5"),
    ("banana", "5"),
    ("naranja", "6"),
    ("tangerine", "6"),
    ("azul", "7"),
    ("peacock", "7"),
    ("gris", "8"),
    ("graphite", "8"),
    ("azul oscuro", "9"),
    ("blueberry", "9"),
    ("verde oscuro", "10"),
    ("basil", "10"),
    ("rojo", "11"),
    ("tomato", "11"),
];

/// Map a color name or numeric id ("1" to "11") to a color id. Unknown
/// names yield `None`.
pub fn color_id(name: &str) -> Option<&'static str> {
    let name = name.trim().to_lowercase();
    COLORS
        .iter()
        .find(|(n, id)| *n == name || *id == name)
        .map(|(_, id)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_id() {
        assert_eq!(color_id("rojo"), Some("11"));
        assert_eq!(color_id("Tomato"), Some("11"));
        assert_eq!(color_id("azul oscuro"), Some("9"));
        assert_eq!(color_id("7"), Some("7"));
        assert_eq!(color_id("12"), None);
        assert_eq!(color_id("chartreuse"), None);
    }
}
