use crate::{
    error::Result,
    handlers::auth::FormResponse,
    middleware_layer::in_flight::InFlightGuard,
    validation::forms::{ContactForm, FormCheck},
    validation::phone::format_phone,
};

/// Drives the public contact form. Messages are only logged.
#[derive(Clone, Default)]
pub struct ContactController {
    guard: InFlightGuard,
}

impl ContactController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles a contact message.
    pub async fn submit(&self, form: ContactForm) -> Result<FormResponse> {
        form.check()?;
        let _permit = self.guard.acquire()?;

        let phone = match form.phone.trim() {
            "" => "-".to_string(),
            raw => format_phone(raw),
        };
        tracing::info!(
            "📨 Contact message from {} <{}> phone {}: {} chars",
            form.name.trim(),
            form.email.trim(),
            phone,
            form.message.trim().chars().count()
        );

        Ok(FormResponse::ok(
            "Message sent successfully! We will get back to you soon.",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn form() -> ContactForm {
        ContactForm {
            name: "Ana Souza".to_string(),
            email: "ana@example.com".to_string(),
            phone: String::new(),
            message: "Gostaria de saber mais sobre as rotas sugeridas.".to_string(),
        }
    }

    #[tokio::test]
    async fn valid_message_is_accepted_without_phone() {
        let response = ContactController::new().submit(form()).await.unwrap();
        assert!(response.success);
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let mut form = form();
        form.message = "   ".to_string();
        let result = ContactController::new().submit(form).await;
        assert!(matches!(result, Err(AppError::ValidationFailed { .. })));
    }

    #[tokio::test]
    async fn incomplete_phone_is_rejected() {
        let mut form = form();
        form.phone = "(11) 9876".to_string();
        let result = ContactController::new().submit(form).await;
        assert!(matches!(result, Err(AppError::ValidationFailed { .. })));
    }
}
