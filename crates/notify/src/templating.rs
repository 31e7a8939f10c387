//! Minijinja templates for every message the bot sends.
//!
//! Templates are fixed and registered once at construction. Output is
//! Telegram legacy Markdown.

use minijinja::{context, Environment};
use svitlo_core::RenderedSchedule;

use crate::traits::DeliveryError;

/// Label of the reply-keyboard refresh button; also accepted as a command.
pub const CHECK_BUTTON_LABEL: &str = "🔄 Перевірити графік";

const CHANGE_NOTICE: &str = "change_notice";
const SCHEDULE_REPLY: &str = "schedule_reply";
const GREETING: &str = "greeting";
const ALREADY_SUBSCRIBED: &str = "already_subscribed";
const UNAVAILABLE: &str = "unavailable";

const TEMPLATES: &[(&str, &str)] = &[
    (
        CHANGE_NOTICE,
        "🔔 *Оновлення на {{ date }}:*\n\nГрафік змінився:\n\n{{ schedule }}",
    ),
    (SCHEDULE_REPLY, "📅 *Графік на {{ date }}:*\n\n{{ schedule }}"),
    (GREETING, "👋 Привіт! Я буду повідомляти вас про зміни."),
    (ALREADY_SUBSCRIBED, "Ви вже підписані. ✅"),
    (UNAVAILABLE, "⚠️ Не вдалося отримати графік. Спробуйте пізніше."),
];

/// Renders the bot's user-facing messages.
#[derive(Debug)]
pub struct MessageRenderer {
    env: Environment<'static>,
}

impl MessageRenderer {
    /// Build the environment and register all templates.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Template`] if a template fails to parse.
    pub fn new() -> Result<Self, DeliveryError> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)
                .map_err(|e| DeliveryError::Template(e.to_string()))?;
        }
        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String, DeliveryError> {
        self.env
            .get_template(name)
            .and_then(|t| t.render(ctx))
            .map_err(|e| DeliveryError::Template(e.to_string()))
    }

    /// Broadcast text for a changed schedule.
    pub fn change_notice(&self, date: &str, schedule: &RenderedSchedule) -> Result<String, DeliveryError> {
        self.render(CHANGE_NOTICE, context! { date, schedule => schedule.as_str() })
    }

    /// Reply to a manual check or a new subscription.
    pub fn schedule_reply(&self, date: &str, schedule: &RenderedSchedule) -> Result<String, DeliveryError> {
        self.render(SCHEDULE_REPLY, context! { date, schedule => schedule.as_str() })
    }

    pub fn greeting(&self) -> Result<String, DeliveryError> {
        self.render(GREETING, context! {})
    }

    pub fn already_subscribed(&self) -> Result<String, DeliveryError> {
        self.render(ALREADY_SUBSCRIBED, context! {})
    }

    /// Shown when no schedule is available.
    pub fn unavailable(&self) -> Result<String, DeliveryError> {
        self.render(UNAVAILABLE, context! {})
    }
}
