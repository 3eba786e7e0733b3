//! Instructions sent to the language model for each reading.
//!
//! Request fields are interpolated verbatim.

use crate::domain::models::ImageReadingKind;

pub const RASHIFAL_CLAUSE: &str =
    "Include Rashi, Nakshatra, Lagna, daily prediction, weekly prediction, and a life summary";

pub fn rashifal_prompt(
    dob: &str,
    time: Option<&str>,
    location: Option<&str>,
    language: &str,
) -> String {
    let mut prompt = format!(
        "Generate an astrological analysis for a person born on {}",
        dob
    );
    if let Some(time) = present(time) {
        prompt.push_str(&format!(" at {}", time));
    }
    if let Some(location) = present(location) {
        prompt.push_str(&format!(" in {}", location));
    }
    prompt.push_str(&format!(". {}, written in {}.", RASHIFAL_CLAUSE, language));
    prompt
}

pub fn muhurat_prompt(language: &str) -> String {
    format!(
        "Give today's muhurat and lucky time suggestions for business, travel, and health. \
         Respond in {}.",
        language
    )
}

pub fn palm_prompt(language: &str) -> String {
    format!(
        "This palm photo was shared for entertainment. Look at the visible life line, \
         heart line, head line and fate line and write a creative, light-hearted palmistry \
         reading covering personality, career and relationships. Respond in {}.",
        language
    )
}

pub fn face_prompt(language: &str) -> String {
    format!(
        "This face photo was shared for entertainment. Look at the forehead, eyes, nose \
         and chin and write a creative, light-hearted face reading in the spirit of \
         Samudrika Shastra covering personality and fortune. Respond in {}.",
        language
    )
}

pub fn image_reading_prompt(kind: ImageReadingKind, language: &str) -> String {
    match kind {
        ImageReadingKind::Palm => palm_prompt(language),
        ImageReadingKind::Face => face_prompt(language),
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
