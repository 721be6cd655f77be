use serde::Serialize;

use crate::config::SessionConfig;

/// 次画面へそのまま引き渡すセッションコンテキスト。
/// 各識別子の内容には関知しない。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionContext {
    pub registration_id: String,
    pub report_id: String,
    pub assignment_id: String,
    pub teacher_username: String,
    pub stream_url: String,
    pub posture_url: String,
}

impl SessionContext {
    pub fn from_config(session: &SessionConfig, stream_url: &str, posture_url: &str) -> Self {
        Self {
            registration_id: session.registration_id.clone(),
            report_id: session.report_id.clone(),
            assignment_id: session.assignment_id.clone(),
            teacher_username: session.teacher_username.clone(),
            stream_url: stream_url.to_string(),
            posture_url: posture_url.to_string(),
        }
    }

    /// コンテキストをクエリとして埋め込んだ次画面のURLを作る。
    /// 空のフィールドは省略する。
    pub fn follow_on_url(&self, base: &str) -> String {
        let fields: [(&str, &str); 6] = [
            ("registration_id", self.registration_id.as_str()),
            ("report_id", self.report_id.as_str()),
            ("assignment_id", self.assignment_id.as_str()),
            ("teacher_username", self.teacher_username.as_str()),
            ("stream_url", self.stream_url.as_str()),
            ("posture_url", self.posture_url.as_str()),
        ];
        let query = fields
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("{}={}", k, percent_encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        if query.is_empty() {
            base.to_string()
        } else if base.contains('?') {
            format!("{base}&{query}")
        } else {
            format!("{base}?{query}")
        }
    }
}

/// クエリ値用の最小限のパーセントエンコード
fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> SessionContext {
        SessionContext {
            registration_id: "reg-1".to_string(),
            report_id: "rep 2".to_string(),
            assignment_id: String::new(),
            teacher_username: "yamada".to_string(),
            stream_url: "http://cam.local/pi-stream/".to_string(),
            posture_url: "http://127.0.0.1:8000/posture".to_string(),
        }
    }

    #[test]
    fn test_follow_on_url_encodes_and_skips_empty() {
        let url = context().follow_on_url("http://127.0.0.1:8000/report");
        assert!(url.starts_with("http://127.0.0.1:8000/report?"));
        assert!(url.contains("registration_id=reg-1"));
        assert!(url.contains("report_id=rep%202"));
        assert!(!url.contains("assignment_id"));
        assert!(url.contains("stream_url=http%3A%2F%2Fcam.local%2Fpi-stream%2F"));
    }

    #[test]
    fn test_follow_on_url_appends_to_existing_query() {
        let url = context().follow_on_url("http://host/report?lang=ja");
        assert!(url.starts_with("http://host/report?lang=ja&"));
    }

    #[test]
    fn test_follow_on_url_empty_context() {
        let url = SessionContext::default().follow_on_url("http://host/report");
        assert_eq!(url, "http://host/report");
    }
}
