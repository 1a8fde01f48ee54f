use crate::generate::{IM_END, IM_START};
use crate::retrieve_chunks::Passage;

/// Opens a user turn. The prompt buffer always ends with this marker.
pub const TURN_PREFIX: &str = "\n<|im_start|>user\n";
/// Closes a user turn and opens the assistant turn.
pub const TURN_SUFFIX: &str = "\n<|im_end|>\n<|im_start|>assistant\n";

/// Renders passages one per line as `id: content`, flattening line breaks.
pub fn format_sources(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| format!("{}: {}", p.id, p.content.replace(['\n', '\r'], " ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The system block with the passages substituted in.
pub fn system_block(passages: &[Passage]) -> String {
    format!(
        "{IM_START}system
Autat finanssivalvojia löytämään tietoja valvottavista laitoksista niiden vuosikertomusten tietojen perusteella. 
Vastaa AINOASTAAN alla olevassa lähdeluettelossa luetelluilla tosiasioilla. Jos alla olevat tiedot eivät riitä, sano, että sinulla ei ole tietoa kyseisestä asiasta. Älä laadi vastauksia, joissa ei käytetä alla lueteltuja lähteitä. Vastaus \"Olen pahoillani, mutta minulla ei ole siitä tietoa.\" on parempi kuin vastata tiedoilla, joita ei ole mainittu lähteissä. Jos käyttäjälle esitettävä tarkentava kysymys auttaisi, kysy kysymys. 
Kunkin lähteen nimi, jota seuraa kaksoispiste ja varsinainen tieto. Ilmoita lähteen nimi aina vastauksesi jokaisen lauseen jälkeen. Käytä lähdeviittauksessa neliömetrejä. Jos sinulle on esimerkiksi annettu lähde nimeltä \"finnair_21\", voit mainita sen muodossa [finnair_21]. Älä yhdistä lähteitä, vaan mainitse kukin lähde erikseen, esimerkiksi [finnair_21][fortum_203].
Älä missään tapauksessa keksi mitään tietoja, joita ei ole mainittu annetuissa lähteissä!

Lähteet:
{}

{IM_END}",
        format_sources(passages)
    )
}

/// System block + transcript so far + the new question + an open assistant turn.
///
/// No length budgeting is applied; a long conversation can outgrow the
/// model's context window.
pub fn assemble_prompt(passages: &[Passage], prompt_history: &str, question: &str) -> String {
    let mut prompt = system_block(passages);
    prompt.push_str(prompt_history);
    prompt.push_str(question);
    prompt.push_str(TURN_SUFFIX);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(id: &str, content: &str) -> Passage {
        Passage {
            id: id.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn sources_are_flattened_to_one_line_each() {
        let passages = vec![
            passage("finnair_21", "Tilintarkastaja\noli KPMG\r\nOy"),
            passage("fortum_203", "Päästöt laskivat"),
        ];
        assert_eq!(
            format_sources(&passages),
            "finnair_21: Tilintarkastaja oli KPMG  Oy\nfortum_203: Päästöt laskivat"
        );
    }

    #[test]
    fn prompt_starts_with_system_block_and_ends_with_open_assistant_turn() {
        let passages = vec![passage("nokia_4", "a"), passage("qt_17", "b")];
        let prompt = assemble_prompt(&passages, TURN_PREFIX, "Kuka oli tilintarkastaja?");

        assert!(prompt.starts_with("<|im_start|>system\n"));
        assert!(prompt.ends_with(TURN_SUFFIX));
        let block_end = prompt.find(IM_END).unwrap();
        for id in ["nokia_4", "qt_17"] {
            assert!(prompt[..block_end].contains(id));
        }
        assert!(prompt.contains("<|im_start|>user\nKuka oli tilintarkastaja?\n<|im_end|>"));
    }

    #[test]
    fn no_passages_leaves_empty_source_list() {
        let prompt = assemble_prompt(&[], TURN_PREFIX, "Hei");
        assert!(prompt.contains("Lähteet:\n\n\n<|im_end|>"));
    }

    #[test]
    fn instruction_lines_keep_their_trailing_spaces() {
        let block = system_block(&[]);
        assert!(block.contains("vuosikertomusten tietojen perusteella. \nVastaa AINOASTAAN"));
        assert!(block.contains("auttaisi, kysy kysymys. \nKunkin lähteen"));
        assert!(block.contains("[finnair_21][fortum_203].\nÄlä missään"));
    }
}
