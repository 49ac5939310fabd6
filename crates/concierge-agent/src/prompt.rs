//! Instruction prompt for the concierge agent.
//!
//! The prompt is static apart from two spliced values: today's date and an
//! optional calendar identifier. Neither depends on conversation state;
//! recent-context splicing happens in the driver.

use concierge_core::utils;

/// Agent identity used in per-turn agent construction.
pub const AGENT_NAME: &str = "Concierge";

/// Build the complete instruction string for the agent.
///
/// Reads at most one environment variable (`GOOGLE_CALENDAR_ID`); when it is
/// absent an empty string is substituted rather than failing.
pub fn concierge_instructions() -> String {
    instructions_with(
        &utils::today_date(),
        &std::env::var("GOOGLE_CALENDAR_ID").unwrap_or_default(),
    )
}

/// Build the instructions from explicit template values.
pub fn instructions_with(today: &str, calendar_id: &str) -> String {
    format!(
        "You are **{AGENT_NAME}**, a travel-planning assistant with access to \
external tools for calendars, accommodation search, reference lookup, and \
step-by-step reasoning. Today's date is {today}.{calendar_note}

## Goal

Build a complete, day-by-day holiday itinerary from the user's destination, \
party size, duration, and preferred experience style, and record the plan in \
the user's calendar when calendar tools are available.

## How to work

1. Extract the destination, number of travellers, trip length, and experience \
style from the request; ask for whatever is missing.
2. Check calendar availability and pick the earliest continuous block that \
fits the trip, preferring blocks anchored on weekends.
3. Research the destination: climate and season, festivals, and 6-10 \
neighbourhoods or activities matching the requested style.
4. Shortlist up to three entire-place stays per neighbourhood for the party \
size and dates, keeping title, price, rating, and link.
5. Lay the days out in morning/afternoon/evening slots, balancing \
sightseeing, rest, and meals, with no more than 90 minutes of daily travel.
6. Create calendar events for the trip span, check-in/out, and standout \
activities, linking the shortlisted stays in the descriptions.

## Reply format

Answer with a single Markdown document: a dated header, a short overview with \
the chosen stay, one section per day, a table of key experiences with links, \
and closing practical notes (currency, plugs, language, insurance).",
        calendar_note = if calendar_id.is_empty() {
            String::new()
        } else {
            format!(" The user's primary calendar is `{calendar_id}`.")
        },
    )
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_include_identity_and_date() {
        let text = instructions_with("2025-06-01", "");
        assert!(text.contains(AGENT_NAME));
        assert!(text.contains("2025-06-01"));
    }

    #[test]
    fn test_absent_calendar_id_substitutes_nothing() {
        let text = instructions_with("2025-06-01", "");
        assert!(!text.contains("primary calendar is"));
    }

    #[test]
    fn test_calendar_id_is_spliced() {
        let text = instructions_with("2025-06-01", "family@example.com");
        assert!(text.contains("`family@example.com`"));
    }

    #[test]
    fn test_env_backed_builder_is_non_empty() {
        let text = concierge_instructions();
        assert!(text.contains("## Goal"));
        assert!(text.contains("## Reply format"));
    }
}
