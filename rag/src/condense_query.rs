use tracing::debug;

use crate::error::Result;
use crate::generate::{Completer, CompletionRequest};

const CONDENSE_MAX_TOKENS: u32 = 32;

/// Rewrites the question into a search query that carries the conversation
/// so far. First turns are passed through without a model call.
pub fn condense_query(
    completer: &dyn Completer,
    history: &[String],
    question: &str,
    temperature: f32,
) -> Result<String> {
    if history.is_empty() {
        return Ok(question.to_string());
    }
    let prompt = condense_prompt(history, question);
    let query = completer.complete(&CompletionRequest {
        prompt,
        temperature,
        max_tokens: CONDENSE_MAX_TOKENS,
        stop: vec!["\n".to_string()],
    })?;
    debug!(turns = history.len(), query = %query, "condensed search query");
    Ok(query)
}

pub fn condense_prompt(history: &[String], question: &str) -> String {
    format!(
        "Alla on yhteenveto tähänastisesta keskustelusta ja käyttäjän esittämä uusi kysymys, johon on vastattava etsimällä tietopankista. Luo hakukysely keskustelun ja uuden kysymyksen perusteella. Lähteiden nimet eivät ole hyviä hakusanoja, jotka kannattaa sisällyttää hakukyselyyn.

Yhteenveto:
{}

Kysymys:
{}

Hakukysely:
",
        history.join("\n"),
        question
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        calls: Mutex<Vec<CompletionRequest>>,
    }

    impl Completer for Recording {
        fn complete(&self, req: &CompletionRequest) -> Result<String> {
            self.calls.lock().unwrap().push(req.clone());
            Ok(" Finnairin tilintarkastaja 2022".to_string())
        }
    }

    fn recording() -> Recording {
        Recording {
            calls: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn first_turn_skips_the_model() {
        let completer = recording();
        let query = condense_query(&completer, &[], "Kuka oli tilintarkastaja?", 0.2).unwrap();
        assert_eq!(query, "Kuka oli tilintarkastaja?");
        assert!(completer.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn later_turns_send_history_and_question() {
        let completer = recording();
        let history = vec![
            "user: Mikä on Finnairin liikevaihto?".to_string(),
            "assistant: Noin 2,4 mrd euroa [finnair_12].".to_string(),
        ];
        let query = condense_query(&completer, &history, "Kuka oli tilintarkastaja?", 0.2).unwrap();
        assert_eq!(query, " Finnairin tilintarkastaja 2022");

        let calls = completer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let req = &calls[0];
        assert!(req.prompt.contains(&history.join("\n")));
        assert!(req.prompt.contains("Kuka oli tilintarkastaja?"));
        assert_eq!(req.max_tokens, 32);
        assert_eq!(req.stop, vec!["\n".to_string()]);
    }
}
