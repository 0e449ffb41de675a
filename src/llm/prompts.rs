// ABOUTME: Prompt templates for fridge photo analysis and natural-language recipe search
// ABOUTME: Both prompts ask the model for strict JSON so replies can be parsed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// System prompt for extracting ingredients from a fridge or pantry photo
pub const FRIDGE_ANALYSIS_PROMPT: &str = "You are a kitchen assistant. Look at the photo of a \
fridge or pantry and list the food ingredients you can identify. Reply with only a JSON array \
of lower-case ingredient names in singular form, for example [\"egg\", \"tomato\", \"cheddar \
cheese\"]. Do not include brands, containers or non-food items.";

/// User message accompanying the fridge photo
pub const FRIDGE_ANALYSIS_REQUEST: &str = "Which ingredients are in this picture?";

/// System prompt for turning free text into structured search filters
pub const RECIPE_QUERY_PROMPT: &str = "You convert a cooking request into recipe search filters. \
Reply with only a JSON object with these optional keys: \"query\" (short dish keywords), \
\"cuisine\", \"diet\", \"intolerances\" (comma separated), \"type\" (dish type such as \
\"main course\" or \"dessert\") and \"max_ready_time\" (minutes, integer). Omit keys the \
request does not mention.";
