//! Fixed replies that don't come from the model.
use super::models::IntentKind;
use crate::core::Language;

pub fn unparseable_reply(lang: Language) -> &'static str {
    match lang {
        Language::Es => "Disculpá, tuve un problema procesando tu solicitud. ¿Podés reformularla?",
        Language::En => "Sorry, I had trouble processing your request. Could you rephrase it?",
    }
}

pub fn model_unavailable(lang: Language) -> &'static str {
    match lang {
        Language::Es => "Disculpá, el asistente no está disponible en este momento. Probá de nuevo en unos minutos.",
        Language::En => "Sorry, the assistant is unavailable right now. Please try again in a few minutes.",
    }
}

pub fn auth_required(lang: Language) -> &'static str {
    match lang {
        Language::Es => "No hay una cuenta conectada. Conectá tu cuenta de Google para continuar.",
        Language::En => "No account is connected. Connect your Google account to continue.",
    }
}

pub fn session_expired(lang: Language) -> &'static str {
    match lang {
        Language::Es => "Tu sesión expiró. Volvé a conectar tu cuenta de Google.",
        Language::En => "Your session expired. Please reconnect your Google account.",
    }
}

pub fn internal_error(lang: Language) -> &'static str {
    match lang {
        Language::Es => "Ocurrió un error inesperado.",
        Language::En => "An unexpected error occurred.",
    }
}

pub fn problem(lang: Language, action: &str, reason: &str) -> String {
    match lang {
        Language::Es => format!("Hubo un problema {}: {}", action, reason),
        Language::En => format!("There was a problem {}: {}", action, reason),
    }
}

/// Gerund describing what was being attempted, used in `problem`.
pub fn activity(lang: Language, intent: IntentKind) -> &'static str {
    match (lang, intent) {
        (Language::Es, IntentKind::CreateEvent) => "creando el evento",
        (Language::Es, IntentKind::UpdateEvent) => "actualizando el evento",
        (Language::Es, IntentKind::DeleteEvent) => "eliminando el evento",
        (Language::Es, IntentKind::ListEvents) => "consultando tus eventos",
        (Language::Es, IntentKind::CreateTask) => "creando la tarea",
        (Language::Es, IntentKind::UpdateTask) => "actualizando la tarea",
        (Language::Es, IntentKind::DeleteTask) => "eliminando la tarea",
        (Language::Es, IntentKind::ListTasks) => "consultando tus tareas",
        (Language::Es, _) => "procesando tu solicitud",
        (Language::En, IntentKind::CreateEvent) => "creating the event",
        (Language::En, IntentKind::UpdateEvent) => "updating the event",
        (Language::En, IntentKind::DeleteEvent) => "deleting the event",
        (Language::En, IntentKind::ListEvents) => "fetching your events",
        (Language::En, IntentKind::CreateTask) => "creating the task",
        (Language::En, IntentKind::UpdateTask) => "updating the task",
        (Language::En, IntentKind::DeleteTask) => "deleting the task",
        (Language::En, IntentKind::ListTasks) => "fetching your tasks",
        (Language::En, _) => "processing your request",
    }
}

pub fn missing_information(lang: Language, fields: &[String]) -> String {
    match lang {
        Language::Es => format!("Me falta información: {}. ¿Me la pasás?", fields.join(", ")),
        Language::En => format!(
            "I'm missing some information: {}. Could you tell me?",
            fields.join(", ")
        ),
    }
}

pub fn confirm_create_event(lang: Language, title: &str) -> String {
    match lang {
        Language::Es => format!("¿Creo el evento \"{}\"?", title),
        Language::En => format!("Should I create the event \"{}\"?", title),
    }
}

pub fn confirm_create_task(lang: Language, title: &str) -> String {
    match lang {
        Language::Es => format!("¿Creo la tarea \"{}\"?", title),
        Language::En => format!("Should I create the task \"{}\"?", title),
    }
}

pub fn no_matching_events(lang: Language) -> &'static str {
    match lang {
        Language::Es => "No encontré eventos que coincidan con esa búsqueda.",
        Language::En => "I couldn't find any events matching that search.",
    }
}

pub fn no_matching_tasks(lang: Language) -> &'static str {
    match lang {
        Language::Es => "No encontré tareas pendientes que coincidan con esa búsqueda.",
        Language::En => "I couldn't find any open tasks matching that search.",
    }
}

pub fn confirm_delete(lang: Language, count: usize, noun: Noun) -> String {
    match lang {
        Language::Es => format!("Encontré {} {}. ¿Los elimino?", count, noun.es(count)),
        Language::En => format!("I found {} {}. Should I delete them?", count, noun.en(count)),
    }
}

pub fn confirm_update(lang: Language, count: usize, noun: Noun) -> String {
    match lang {
        Language::Es => format!("Encontré {} {}. ¿Aplico los cambios?", count, noun.es(count)),
        Language::En => format!(
            "I found {} {}. Should I apply the changes?",
            count,
            noun.en(count)
        ),
    }
}

pub fn nothing_to_update(lang: Language) -> &'static str {
    match lang {
        Language::Es => "No me dijiste qué querés cambiar.",
        Language::En => "You didn't tell me what to change.",
    }
}

pub fn no_events_listed(lang: Language) -> &'static str {
    match lang {
        Language::Es => "No tenés eventos en ese período.",
        Language::En => "You have no events in that period.",
    }
}

pub fn no_tasks_listed(lang: Language) -> &'static str {
    match lang {
        Language::Es => "No tenés tareas en ese período.",
        Language::En => "You have no tasks in that period.",
    }
}

pub fn listed(lang: Language, count: usize, noun: Noun) -> String {
    match lang {
        Language::Es => format!("Tenés {} {}.", count, noun.es(count)),
        Language::En => format!("You have {} {}.", count, noun.en(count)),
    }
}

pub fn event_created(lang: Language, title: &str) -> String {
    match lang {
        Language::Es => format!("Listo, creé el evento \"{}\".", title),
        Language::En => format!("Done, I created the event \"{}\".", title),
    }
}

pub fn task_created(
    lang: Language,
    title: &str,
    subtasks_created: usize,
    subtasks_failed: usize,
) -> String {
    match lang {
        Language::Es => {
            let mut text = format!("Listo, creé la tarea \"{}\"", title);
            if subtasks_created > 0 {
                text.push_str(&format!(" con {} subtarea(s)", subtasks_created));
            }
            text.push('.');
            if subtasks_failed > 0 {
                text.push_str(&format!(" No pude crear {} subtarea(s).", subtasks_failed));
            }
            text
        }
        Language::En => {
            let mut text = format!("Done, I created the task \"{}\"", title);
            if subtasks_created > 0 {
                text.push_str(&format!(" with {} subtask(s)", subtasks_created));
            }
            text.push('.');
            if subtasks_failed > 0 {
                text.push_str(&format!(" {} subtask(s) could not be created.", subtasks_failed));
            }
            text
        }
    }
}

pub fn batch_deleted(lang: Language, success: usize, failed: usize, noun: Noun) -> String {
    match (lang, failed) {
        (Language::Es, 0) => format!("Listo, eliminé {} {}.", success, noun.es(success)),
        (Language::Es, _) => format!(
            "Eliminé {} {}, pero {} no se pudieron eliminar.",
            success,
            noun.es(success),
            failed
        ),
        (Language::En, 0) => format!("Done, I deleted {} {}.", success, noun.en(success)),
        (Language::En, _) => format!(
            "I deleted {} {}, but {} could not be deleted.",
            success,
            noun.en(success),
            failed
        ),
    }
}

pub fn batch_updated(lang: Language, success: usize, failed: usize, noun: Noun) -> String {
    match (lang, failed) {
        (Language::Es, 0) => format!("Listo, actualicé {} {}.", success, noun.es(success)),
        (Language::Es, _) => format!(
            "Actualicé {} {}, pero {} no se pudieron actualizar.",
            success,
            noun.es(success),
            failed
        ),
        (Language::En, 0) => format!("Done, I updated {} {}.", success, noun.en(success)),
        (Language::En, _) => format!(
            "I updated {} {}, but {} could not be updated.",
            success,
            noun.en(success),
            failed
        ),
    }
}

pub fn invalid_time_range(lang: Language) -> &'static str {
    match lang {
        Language::Es => "La hora de fin tiene que ser posterior a la de inicio.",
        Language::En => "The end time must be after the start time.",
    }
}

pub fn cancelled(lang: Language) -> &'static str {
    match lang {
        Language::Es => "Listo, cancelé la operación.",
        Language::En => "Okay, I cancelled that.",
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Noun {
    Event,
    Task,
}

impl Noun {
    fn es(self, count: usize) -> &'static str {
        match (self, count) {
            (Noun::Event, 1) => "evento",
            (Noun::Event, _) => "eventos",
            (Noun::Task, 1) => "tarea",
            (Noun::Task, _) => "tareas",
        }
    }

    fn en(self, count: usize) -> &'static str {
        match (self, count) {
            (Noun::Event, 1) => "event",
            (Noun::Event, _) => "events",
            (Noun::Task, 1) => "task",
            (Noun::Task, _) => "tasks",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_messages() {
        assert_eq!(
            batch_deleted(Language::En, 2, 1, Noun::Event),
            "I deleted 2 events, but 1 could not be deleted."
        );
        assert_eq!(
            batch_deleted(Language::Es, 1, 0, Noun::Task),
            "Listo, eliminé 1 tarea."
        );
    }

    #[test]
    fn test_task_created_message() {
        assert_eq!(
            task_created(Language::En, "Groceries", 1, 1),
            "Done, I created the task \"Groceries\" with 1 subtask(s). 1 subtask(s) could not be created."
        );
    }
}
