//! Prompt builder for asking a generative model to guess the typology.
//!
//! The prompt shows a few source/translation pairs and the corpus scores but
//! never names the target language.

use crate::error::{ensure_same_len, Result};
use crate::scoring::CorpusScores;
use crate::typology::Typology;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Build the prompt from `k` examples chosen by a seeded shuffle.
///
/// `k` is capped at the number of examples available.
pub fn make_typology_prompt(
    sources: &[String],
    translations: &[String],
    scores: &CorpusScores,
    k: usize,
    seed: u64,
) -> Result<String> {
    ensure_same_len("translations", sources.len(), translations.len())?;

    let k = k.min(sources.len());
    let mut indices: Vec<usize> = (0..sources.len()).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));
    indices.truncate(k);

    let mut examples = String::new();
    for i in indices {
        examples.push_str(&format!("Source: {}\nTranslation: {}\n\n", sources[i], translations[i]));
    }

    let labels = Typology::CANONICAL
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let prompt = format!(
        "You are an expert linguist and machine translation researcher.

Below are {k} examples of English source sentences and their machine translations
into an unknown target language, produced by a strong neural MT system.

You will also see aggregated MT quality scores for this language:
- BLEU: {bleu:.2}
- chrF: {chrf:.2}
- COMET: {comet:.3}

Your task: based on these outputs, infer which morphological typology the target
language most likely belongs to.

Possible categories:
{labels}

Examples:
{examples}
Answer with only one word: one of {labels}.",
        k = k,
        bleu = scores.bleu,
        chrf = scores.chrf,
        comet = scores.comet,
        labels = labels,
        examples = examples,
    );

    Ok(prompt)
}
