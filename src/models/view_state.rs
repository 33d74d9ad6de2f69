use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ViewState<T> {
    Loading,
    Success(T),
    Error(String),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            ViewState::Success(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for ViewState<T> {
    fn from(res: Result<T, E>) -> Self {
        match res {
            Ok(v) => ViewState::Success(v),
            Err(e) => ViewState::Error(e.to_string()),
        }
    }
}
