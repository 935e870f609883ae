//! Prompt and fallback texts shown around AI completions

/// Prompt asking for a day-by-day itinerary with `**marked**` place names
#[must_use]
pub fn itinerary_prompt(destination: &str, days: u32) -> String {
    format!(
        "Create a concise, practical {days}-day travel itinerary for {destination}.

CRITICAL REQUIREMENTS:
- ONLY include major, well-known attractions, landmarks, and establishments
- Use simple, commonly-known names (e.g., \"Old Town\" not \"Historic Old Quarter\")
- Avoid specific restaurant/cafe/bar names unless they're very famous
- Focus on parks, churches, museums, main squares, rivers, etc.
- For every place, wrap the name in **double asterisks**
- Provide 3-6 items per day with short descriptions

Example format:
**Main Cathedral** - Description
**City Park** - Description
**Old Town Square** - Description"
    )
}

/// Prompt for a free-form question asked within a planned trip
#[must_use]
pub fn question_prompt(destination: &str, days: u32, question: &str) -> String {
    format!(
        "Context: The user is planning a {days}-day trip to {destination}.

IMPORTANT INSTRUCTIONS:
- If the user asks for a specific type of place (restaurants, museums, hotels, etc.), ONLY provide places of that exact type
- ALL places must be located in or very near {destination}
- When mentioning places, use the format **PlaceName** for each place
- Be specific and accurate about locations - only include places that are actually in {destination}
- For each place you mention, provide a brief description (1-2 sentences) about what makes it special or what it offers
- Include practical information like cuisine type, atmosphere, or unique features

User question: {question}"
    )
}

/// Lead-in placed above a generated itinerary
#[must_use]
pub fn itinerary_intro(destination: &str, days: u32) -> String {
    format!("Here is a suggested {days}-day itinerary for {destination}:<br/><br/>")
}

/// Shown when the destination could not be located
#[must_use]
pub fn welcome_message(destination: &str, days: u32) -> String {
    format!(
        "Welcome! I'll help you plan your {days}-day trip to {destination}. What would you like to know about your destination?"
    )
}

pub const FALLBACK_ITINERARY_MESSAGE: &str =
    "Could not generate itinerary automatically. You can ask for suggestions in the chat.";

pub const CONNECTION_TROUBLE_MESSAGE: &str =
    "Sorry, I'm having trouble connecting to the server. Please try again later.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_itinerary_prompt_mentions_trip() {
        let prompt = itinerary_prompt("Anykščiai", 3);
        assert!(prompt.starts_with("Create a concise, practical 3-day travel itinerary for Anykščiai."));
        assert!(prompt.contains("**double asterisks**"));
        assert!(prompt.ends_with("**Old Town Square** - Description"));
    }

    #[test]
    fn test_question_prompt_ends_with_question() {
        let prompt = question_prompt("Vilnius", 2, "Where can I eat cepelinai?");
        assert!(prompt.starts_with("Context: The user is planning a 2-day trip to Vilnius."));
        assert!(prompt.contains("ALL places must be located in or very near Vilnius"));
        assert!(prompt.ends_with("User question: Where can I eat cepelinai?"));
    }

    #[test]
    fn test_fallback_texts() {
        assert_eq!(
            itinerary_intro("Vilnius", 2),
            "Here is a suggested 2-day itinerary for Vilnius:<br/><br/>"
        );
        assert!(welcome_message("Vilnius", 2).contains("2-day trip to Vilnius"));
    }
}
