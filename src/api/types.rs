use serde::Deserialize;

/// Body returned by `GET /query`.
///
/// Field names follow the backend's JSON exactly. `image_url` and `analysis`
/// arrive as `null` when absent; missing keys are tolerated the same way.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct QueryResponse {
    /// True when the backend verified that `execution_result` is an HTML table.
    pub table_output_verified: bool,
    /// Text, markdown, or table markup produced by the analysis.
    pub execution_result: String,
    /// Server-relative path of a rendered chart, e.g. `/static/plot.png`.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Natural-language interpretation of the result.
    #[serde(default)]
    pub analysis: Option<String>,
}

impl QueryResponse {
    /// Image path, treating an empty string the same as `null`.
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|s| !s.is_empty())
    }

    /// Analysis note, treating an empty string the same as `null`.
    pub fn analysis(&self) -> Option<&str> {
        self.analysis.as_deref().filter(|s| !s.is_empty())
    }
}
