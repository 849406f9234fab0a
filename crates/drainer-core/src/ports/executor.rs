//! BatchExecutor port - バッチ処理の差し替えポイント
//!
//! queue はバッチの中身を知らない。1 バッチ分の payload を `BatchExecutor` に渡し、
//! 結果を位置で各 submitter に戻すだけ。

use async_trait::async_trait;

/// 1 バッチ分の payload を処理する。
///
/// # 約束事
/// - `Ok(results)` は payload と同じ順序・同じ件数で返す。件数がずれたらバッチ全体が失敗扱い
/// - `Err(e)` はバッチ内の全タスクを `e` で失敗させる
///
/// # 使用例
/// ```ignore
/// struct Doubler;
///
/// #[async_trait]
/// impl BatchExecutor<u32> for Doubler {
///     type Output = u32;
///     type Error = std::convert::Infallible;
///
///     async fn execute(&self, payloads: Vec<u32>) -> Result<Vec<u32>, Self::Error> {
///         Ok(payloads.into_iter().map(|p| p * 2).collect())
///     }
/// }
/// ```
#[async_trait]
pub trait BatchExecutor<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    type Output: Send + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn execute(&self, payloads: Vec<T>) -> Result<Vec<Self::Output>, Self::Error>;
}
