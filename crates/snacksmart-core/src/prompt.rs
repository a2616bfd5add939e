//! Prompt construction: the system prompt and the profile opening message.

use crate::knowledge::KnowledgeBase;
use crate::models::{Gender, Goal, UserProfile};

const SYSTEM_PROMPT_TEMPLATE: &str = include_str!("../assets/system_prompt.md");
const KNOWLEDGE_SLOT: &str = "{knowledge}";

/// Render the system prompt with the knowledge base in place.
pub fn system_prompt(knowledge: &KnowledgeBase) -> String {
    SYSTEM_PROMPT_TEMPLATE
        .replace(KNOWLEDGE_SLOT, knowledge.text().trim())
        .trim()
        .to_string()
}

pub fn profile_chat_title(profile: &UserProfile) -> String {
    format!(
        "Meal Plan for {}, {}y, {}kg",
        profile.gender, profile.age, profile.weight_kg
    )
}

/// First user message of a profile chat.
pub fn profile_message(profile: &UserProfile) -> String {
    let gender = match profile.gender {
        Gender::Male => "férfi",
        Gender::Female => "nő",
    };
    let goal = match profile.goal {
        Goal::Bulk => "tömeget növeljek",
        Goal::Cut => "fogyjak",
    };

    let mut lines = vec![
        format!(
            "Szia! {} éves {} vagyok, jelenleg {} kg a testsúlyom és {} cm magas vagyok.",
            profile.age, gender, profile.weight_kg, profile.height_cm
        ),
        format!(
            "Átlagosan hetente {} alkalommal szoktam edzeni.",
            profile.workouts_per_week
        ),
        format!(
            "A célom, hogy {} és elérjem a {} kg-os testsúlyt.",
            goal, profile.target_weight_kg
        ),
    ];
    if let Some(calories) = profile.target_calories {
        lines.push(format!(
            "Nagyjából {calories} kcal körüli napi bevitelt szeretnék tartani."
        ));
    }
    if let Some(meals) = profile.meals_per_day {
        lines.push(format!("Általában napi {meals} étkezést preferálok."));
    }
    lines.push(String::new());
    lines.push(
        "Kérlek, készíts egy személyre szabott étrendet pontos tápanyag bontással és étrend-kiegészítő javaslatokkal."
            .to_string(),
    );

    lines.join("\n")
}
