use std::time::Duration;

use anyhow::Result;
use tracing::warn;

use crate::domain::Order;

/// Substituted whenever note generation fails or times out. Note failures
/// never propagate: the order itself is already persisted by the time a
/// note is requested.
pub const FALLBACK_NOTE: &str =
    "Asante kwa oda yako! Vinywaji vyako vinaandaliwa kwa ajili ya usafirishaji wa haraka.";

/// Hard ceiling on how long a note generator may run.
pub const NOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Produces the short decorative message printed on a receipt. External
/// implementations (an LLM call, a template service) live outside the
/// crate; the core only requires this contract.
pub trait NoteGenerator {
    fn generate(&self, order: &Order) -> impl Future<Output = Result<String>> + Send;
}

/// Built-in generator: a fixed thank-you mentioning the first item.
#[derive(Debug, Clone, Default)]
pub struct StaticNotes;

impl NoteGenerator for StaticNotes {
    async fn generate(&self, order: &Order) -> Result<String> {
        let note = match order.items.first() {
            Some(item) => format!(
                "Asante sana kwa kuchagua {}. Tunathamini ununuzi wako - karibu tena!",
                item.name
            ),
            None => "Asante sana kwa ununuzi wako. Karibu tena!".to_string(),
        };
        Ok(note)
    }
}

/// Run a generator under the timeout, substituting the fallback note on
/// any failure.
pub async fn generate_note<G: NoteGenerator>(generator: &G, order: &Order) -> String {
    match tokio::time::timeout(NOTE_TIMEOUT, generator.generate(order)).await {
        Ok(Ok(note)) => note,
        Ok(Err(e)) => {
            warn!(order = %order.id, error = %e, "note generation failed, using fallback");
            FALLBACK_NOTE.to_string()
        }
        Err(_) => {
            warn!(order = %order.id, "note generation timed out, using fallback");
            FALLBACK_NOTE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CartItem, Product};

    struct FailingNotes;

    impl NoteGenerator for FailingNotes {
        async fn generate(&self, _order: &Order) -> Result<String> {
            anyhow::bail!("quota exceeded")
        }
    }

    fn sample_order() -> Order {
        let product = Product::new("safari-lager", "Safari Lager", "Beer", 3500, 2450);
        Order::new(vec![CartItem::from_product(&product, 2)], None, "cash")
    }

    #[tokio::test]
    async fn test_static_notes_mention_an_item() {
        let note = generate_note(&StaticNotes, &sample_order()).await;
        assert!(note.contains("Safari Lager"));
    }

    #[tokio::test]
    async fn test_failure_substitutes_fallback() {
        let note = generate_note(&FailingNotes, &sample_order()).await;
        assert_eq!(note, FALLBACK_NOTE);
    }
}
