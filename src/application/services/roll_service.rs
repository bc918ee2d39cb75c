use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::application::messaging::{evaluator, formatter, parser};
use crate::domain::entities::{IncomingMessageEvent, RollOutcome};
use crate::domain::traits::Transport;

/// Service turning inbound chat text into roll replies
///
/// Holds the process-wide random source; rooms handled concurrently share it
/// through a mutex that is never held across an await point.
pub struct RollService {
    transport: Arc<dyn Transport>,
    rng: Mutex<StdRng>,
}

impl RollService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_rng(transport, StdRng::from_entropy())
    }

    pub fn with_rng(transport: Arc<dyn Transport>, rng: StdRng) -> Self {
        Self {
            transport,
            rng: Mutex::new(rng),
        }
    }

    /// Compute the reply for an event, `None` when the bot stays silent
    pub async fn reply_for(&self, event: &IncomingMessageEvent) -> Option<String> {
        if !event.kind.is_text() {
            return None;
        }
        let command = parser::parse_roll(&event.body)?;

        let outcome = {
            let mut rng = match self.rng.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            evaluator::evaluate(&command, &mut *rng)
        };

        if let RollOutcome::Rejected(reason) = outcome {
            tracing::debug!("[{}] {} rejected: {}", event.room_id, command, reason);
            return Some(formatter::rejection_reply(reason).to_string());
        }

        let display_name = match self.transport.resolve_display_name(&event.sender).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!("Display name lookup for {} failed: {}", event.sender, e);
                event.sender.clone()
            }
        };

        Some(formatter::format_reply(&display_name, &command, &outcome))
    }
}
