//! Prompts and tool definitions for the three model checks.
//!
//! Argument types double as the tool parameter schema, so a verdict that
//! deserializes is also one the schema allowed.

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::llm::ToolSpec;

pub const AUTHOR_TOOL: &str = "is_author";
pub const PERSON_TOOL: &str = "is_person";
pub const ROLE_TOOL: &str = "is_passive_actor";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AuthorVerdict {
    pub is_author: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
pub enum PersonKind {
    #[serde(rename = "Name einer Person")]
    Person,
    #[serde(rename = "Kein Name einer Person")]
    NotPerson,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PersonVerdict {
    #[serde(rename = "type")]
    pub kind: PersonKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
pub enum Role {
    #[serde(rename = "aktiv")]
    Active,
    #[serde(rename = "passiv")]
    Passive,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RoleVerdict {
    pub role: Role,
}

/// Flat JSON schema for tool parameters: subschemas inlined, no `$schema` or
/// `title` keys.
pub fn parameters_schema<T: JsonSchema>() -> Value {
    let settings = SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = true;
        s.meta_schema = None;
    });
    let schema = settings.into_generator().into_root_schema_for::<T>();
    let mut value = serde_json::to_value(schema).unwrap_or_default();
    if let Value::Object(map) = &mut value {
        map.remove("title");
        map.remove("definitions");
    }
    value
}

pub fn author_tool() -> ToolSpec {
    ToolSpec {
        name: AUTHOR_TOOL.to_string(),
        description: "Prüfe, ob es sich bei der genannten Person höchstwahrscheinlich um den Autor, \
                      Interviewer, Fotografen, Illustrator oder Editor des Artikels handelt."
            .to_string(),
        parameters: parameters_schema::<AuthorVerdict>(),
    }
}

pub fn author_prompt(sentence: &str, entity: &str) -> String {
    format!(
        "Du erhältst einen Satz aus einem Artikel. Entscheide, ob der Name '{entity}' \
         höchstwahrscheinlich Autor, Interviewer, Fotograf, Illustrator oder Editor des Artikels ist.\n\
         Sind mehrere Personen am Artikel beteiligt, sind sie oft nacheinander aufgelistet.\
         Die Namen von Autoren, Fotografen und Illustratoren sind oft in Großbuchstaben geschrieben.\n\
         Interviewer ist die Personen, die ein Gespräch oder Interview geführt hat.\n\
         Satz: '{sentence}'\n\
         Bitte gib das Ergebnis als Funktionsaufruf zurück."
    )
}

pub fn person_tool() -> ToolSpec {
    ToolSpec {
        name: PERSON_TOOL.to_string(),
        description: "Beurteile, ob es sich um einen Menschen und dessen Namen handelt \
                      (keine Berufsbezeichnung oder Funktion)."
            .to_string(),
        parameters: parameters_schema::<PersonVerdict>(),
    }
}

pub fn person_prompt(entity: &str, sentence: &str) -> String {
    format!(
        "Ist '{entity}' im folgenden Text der Name einer realen Person? \
         Beachte: Es geht nicht um Berufsbezeichnungen oder Rollen, sondern nur um echte Personennamen.\n\n\
         Text: '{sentence}'\n\
         Entscheide im Zweifelsfall immer, dass es sich um den Namen einer realen Person handelt.\n\
         Bitte gib das Ergebnis als Funktionsaufruf zurück."
    )
}

pub fn role_tool() -> ToolSpec {
    ToolSpec {
        name: ROLE_TOOL.to_string(),
        description: "Klassifiziere, ob die genannte Person im Text eine aktive oder passive Rolle einnimmt. \
                      Siehe Definition: aktiv = kommt zu Wort / eigene Studie; passiv = wird nur erwähnt, \
                      historische Figur."
            .to_string(),
        parameters: parameters_schema::<RoleVerdict>(),
    }
}

pub fn role_prompt(entity: &str, sentence: &str) -> String {
    format!(
        "Bewerte, ob die Person '{entity}' im folgenden Text eine aktive oder passive Rolle einnimmt.\n\n\
         Kontext: '{sentence}'\n\n\
         Definitionen:\n\
         Passiv heißt:\n\
         - Es wird lediglich die Handlung der Person oder etwas, das ihr passiert ist, beschrieben\n\
         - Die Person macht keine konkrete Aussage\n\
         - Es handelt sich um eine historische Persönlichkeit (z. B. Robert Koch, Barbarossa)\n\
         - Die Aussage der Person liegt mehrere Jahre zurück\n\
         \n\
         Aktiv heißt:\n\
         - Die Person kommt direkt über ein Zitat zu Wort\n\
         - Die Person wird indirekt zitiert (erkennbar an Konjunktiv und paraphrasierten Aussagen)\n\
         - Es werden Studien erwähnt, die eine als Wissenschaftler arbeitende Person verfasst hat\n\
         \n\
         Antworte strukturiert mit \"aktiv\" oder \"passiv\".\n\
         Wähle im Zweifelsfall immer \"passiv\".\n\
         Bitte gib das Ergebnis als Funktionsaufruf zurück."
    )
}
