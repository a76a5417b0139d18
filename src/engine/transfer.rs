//! 走査 1 回分のやり取りを表す値オブジェクト

/// 走査が生成する送信単位
///
/// - `id`: 到達点ごとに安定した識別子（回答はこの ID で記録・参照される）
/// - `text`: 送信するテキスト（ないこともある）
/// - `skip`: `true` なら回答を待たずに次へ進む
/// - `terminate_group`: 外側の Group に残りの子の打ち切りを要求する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub id: String,
    pub text: Option<String>,
    pub skip: bool,
    pub terminate_group: bool,
}

impl Transfer {
    /// 回答を求めるプロンプト
    pub fn prompt(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: Some(text.into()),
            skip: false,
            terminate_group: false,
        }
    }

    /// 回答を求めない通知
    pub fn notice(id: impl Into<String>, text: Option<String>) -> Self {
        Self {
            id: id.into(),
            text,
            skip: true,
            terminate_group: false,
        }
    }

    /// テキストを伴わない回答待ち
    pub fn input(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: None,
            skip: false,
            terminate_group: false,
        }
    }

    /// グループ打ち切りのシグナル
    pub fn terminate(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: None,
            skip: true,
            terminate_group: true,
        }
    }

    /// Group が打ち切りシグナルを受け取った後、自身の消費者へ渡す形に変換
    pub fn released(self) -> Self {
        Self {
            skip: true,
            terminate_group: false,
            ..self
        }
    }
}

/// 回答がコマンドと大文字小文字を区別せずに一致するか
pub(crate) fn matches_command(answer: &str, command: &str) -> bool {
    answer.to_lowercase() == command.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let prompt = Transfer::prompt("name", "What's your name?");
        assert!(!prompt.skip);
        assert_eq!(prompt.text.as_deref(), Some("What's your name?"));

        let notice = Transfer::notice("bye", Some("Goodbye".to_string()));
        assert!(notice.skip);
        assert!(!notice.terminate_group);

        let input = Transfer::input("colors.1");
        assert!(!input.skip);
        assert!(input.text.is_none());
    }

    #[test]
    fn test_released_drops_terminate_marker() {
        let released = Transfer::terminate("stop").released();

        assert_eq!(released.id, "stop");
        assert!(released.skip);
        assert!(!released.terminate_group);
        assert!(released.text.is_none());
    }

    #[test]
    fn test_matches_command_ignores_case() {
        assert!(matches_command("STOP", "stop"));
        assert!(matches_command("Done", "dONE"));
        assert!(!matches_command("stopped", "stop"));
    }
}
