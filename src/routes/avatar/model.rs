use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct RenderParams {
    /// `json` 输出 JSON，其余输出 SVG
    pub format: Option<String>,
    /// 覆盖服务端的 Steam API key
    pub key: Option<String>,
}

impl RenderParams {
    pub fn wants_json(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }

    pub fn api_key<'a>(&'a self, default: &'a str) -> &'a str {
        self.key
            .as_deref()
            .filter(|k| !k.is_empty())
            .unwrap_or(default)
    }
}
