#[path = "providers/gemini_api.rs"]
mod gemini_api;
#[path = "providers/serp_api.rs"]
mod serp_api;
