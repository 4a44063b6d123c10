//! Canned starter questions offered before the first exchange.

pub const SUGGESTED_QUESTIONS: [&str; 5] = [
    "What are the top 5 most purchased items?",
    "Show me the distribution of purchase amounts",
    "What's the average purchase amount?",
    "Which day of the week has the most purchases?",
    "What's the trend of purchases over time?",
];
