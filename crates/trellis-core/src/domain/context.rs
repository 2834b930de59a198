//! Context - 呼び出し単位のキャンセル・期限・トレース
//!
//! すべての port 呼び出しは `&Context` を受け取ります。
//! オーケストレータは `Context::guard` で各呼び出しを包み、
//! キャンセルや期限切れを `Interrupted` として即座に返します。
//!
//! グローバルな logger/tracer の代わりに、親 span をここで持ち回ります。

use std::future::{Future, pending};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// 進行中の呼び出しを中断した理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    #[error("operation cancelled by caller")]
    Cancelled,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

/// オーケストレータと全ポートに持ち回る呼び出し単位の Context
///
/// clone は安価で、clone 同士は同じキャンセル信号を見る
#[derive(Debug, Clone)]
pub struct Context {
    cancel: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
    span: tracing::Span,
}

/// キャンセル可能な Context の送信側
///
/// drop してもキャンセルされない（`cancel()` だけがキャンセルする）
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // receivers may already be gone
        let _ = self.tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Context {
    /// キャンセルも期限も無い Context
    pub fn background() -> Self {
        Self {
            cancel: None,
            deadline: None,
            span: tracing::Span::none(),
        }
    }

    /// Context と、それをキャンセルするハンドル
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let ctx = Self {
            cancel: Some(rx),
            ..Self::background()
        };
        (ctx, CancelHandle { tx })
    }

    /// 期限が今から最大 `timeout` の Context を派生
    ///
    /// 既存の期限の方が早ければそちらを残す
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// この Context の下で走る操作の親 span を設定
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// 待たずに現在の中断状態を返す
    pub fn check(&self) -> Result<(), Interrupted> {
        if let Some(rx) = &self.cancel
            && *rx.borrow()
        {
            return Err(Interrupted::Cancelled);
        }
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(Interrupted::DeadlineExceeded);
        }
        Ok(())
    }

    /// キャンセルされたら完了する
    ///
    /// キャンセル信号が無い、またはハンドルがキャンセルされずに drop された
    /// Context では完了しない
    pub async fn cancelled(&self) {
        let Some(rx) = &self.cancel else {
            return pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return pending().await;
            }
        }
    }

    async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => pending().await,
        }
    }

    /// キャンセルか期限切れが先に来なければ `fut` を実行
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, Interrupted> {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(Interrupted::Cancelled),
            _ = self.expired() => Err(Interrupted::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_context_runs_to_completion() {
        let ctx = Context::background();
        let out = ctx.guard(async { 7 }).await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test]
    async fn cancelled_context_refuses_new_work() {
        let (ctx, handle) = Context::with_cancel();
        handle.cancel();

        let out = ctx.guard(async { 7 }).await;
        assert_eq!(out, Err(Interrupted::Cancelled));
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_aborts_in_flight_call() {
        let (ctx, handle) = Context::with_cancel();

        let (out, ()) = tokio::join!(ctx.guard(pending::<()>()), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.cancel();
        });
        assert_eq!(out, Err(Interrupted::Cancelled));
    }

    #[tokio::test]
    async fn dropped_handle_does_not_cancel() {
        let (ctx, handle) = Context::with_cancel();
        drop(handle);

        let out = ctx.guard(async { "done" }).await;
        assert_eq!(out, Ok("done"));
    }

    #[tokio::test]
    async fn deadline_aborts_slow_call() {
        let ctx = Context::background().with_timeout(Duration::from_millis(10));
        let out = ctx.guard(pending::<()>()).await;
        assert_eq!(out, Err(Interrupted::DeadlineExceeded));
    }

    #[test]
    fn earlier_deadline_wins() {
        let base = Context::background().with_timeout(Duration::from_millis(5));
        let derived = base.with_timeout(Duration::from_secs(60));
        assert_eq!(derived.deadline(), base.deadline());
    }
}
