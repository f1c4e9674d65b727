use crate::models::PreferenceInput;

/// Number of suggestions requested when config does not override it.
pub const DEFAULT_RESULT_COUNT: u32 = 10;

/// Build the generation instruction for a set of preferences.
///
/// Pure: identical input always produces identical text. Sets iterate in
/// sorted order, so joined lists are stable.
pub fn build_prompt(input: &PreferenceInput, count: u32) -> String {
    let place_types = join(&input.place_types);
    let cuisines = join(&input.cuisines);

    format!(
        "You are a travel planner. Respond with a JSON array only. \
Do not include markdown, code fences, explanations or any text before or after the array.\n\
Each element of the array must be an object with exactly these fields:\n\
- \"place_name\": string\n\
- \"budget\": number (estimated total cost in INR)\n\
- \"description\": string\n\
- \"image_url\": string\n\
- \"itinerary\": array of strings, one entry per day, in order\n\
\n\
Traveller details:\n\
- Budget: \u{20b9}{budget}\n\
- Age: {age}\n\
- Starting location: {location}\n\
- Preferred place types: {place_types}\n\
- Preferred cuisines: {cuisines}\n\
\n\
Return exactly {count} destinations that fit within the budget.",
        budget = input.budget,
        age = input.age,
        location = input.location,
    )
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
