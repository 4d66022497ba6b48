//! Domain factories for creating domain entities and value objects.

use rand::Rng;

use super::value_object::{JOIN_CODE_ALPHABET, JOIN_CODE_LENGTH, JoinCode, SessionId};

/// Factory for generating SessionId instances.
///
/// This factory encapsulates the logic for generating new session identifiers,
/// separating the generation concern from the validation logic in SessionId.
pub struct SessionIdFactory;

impl SessionIdFactory {
    /// Generate a new SessionId with a random UUID v4.
    pub fn generate() -> SessionId {
        SessionId::from_uuid(uuid::Uuid::new_v4())
    }
}

/// Factory for generating join codes.
///
/// Uniqueness is not checked here; the session store rejects a code that is
/// already used by an active session and the caller draws again.
pub struct JoinCodeFactory;

impl JoinCodeFactory {
    /// Draw a random code of [`JOIN_CODE_LENGTH`] characters from [`JOIN_CODE_ALPHABET`].
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> JoinCode {
        let code: String = (0..JOIN_CODE_LENGTH)
            .map(|_| char::from(JOIN_CODE_ALPHABET[rng.gen_range(0..JOIN_CODE_ALPHABET.len())]))
            .collect();
        // Every character comes from the alphabet, so validation cannot fail.
        JoinCode::new(code.clone()).unwrap_or_else(|_| unreachable!("invalid join code {code}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_session_id_factory_generate() {
        // テスト項目: SessionIdFactory::generate() で UUID v4 形式の SessionId を生成できる
        // when (操作):
        let session_id = SessionIdFactory::generate();

        // then (期待する結果):
        // UUID v4 形式であることを確認（長さと形式）
        let id_str = session_id.as_str();
        assert_eq!(id_str.len(), 36); // UUID v4 の標準長（ハイフン含む）
        assert!(SessionId::new(id_str.to_string()).is_ok());
    }

    #[test]
    fn test_session_id_factory_generate_uniqueness() {
        // テスト項目: SessionIdFactory::generate() は毎回異なる ID を生成する
        let id1 = SessionIdFactory::generate();
        let id2 = SessionIdFactory::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_join_code_factory_alphabet() {
        // テスト項目: 生成される参加コードは 6 文字の英大文字・数字のみ
        // given (前提条件):
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            // when (操作):
            let code = JoinCodeFactory::generate(&mut rng);

            // then (期待する結果):
            assert_eq!(code.as_str().len(), 6);
            assert!(
                code.as_str()
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            );
        }
    }
}
