use tracing::{debug, warn};

use crate::error::SessionError;
use crate::session::{Session, SessionFactory};

/// 会话租约
///
/// 正常路径调用 `close()`；如果租约在关闭前被 drop（错误提前返回、任务被取消、超时），
/// 则同步调用 `force_release()`。每个打开的会话恰好释放一次。
pub struct SessionLease {
    session: Option<Box<dyn Session>>,
}

impl SessionLease {
    pub async fn open(factory: &dyn SessionFactory) -> Result<Self, SessionError> {
        let session = factory.open().await?;
        debug!("会话已打开");
        Ok(Self {
            session: Some(session),
        })
    }

    pub fn session(&mut self) -> Result<&mut (dyn Session + 'static), SessionError> {
        self.session.as_deref_mut().ok_or(SessionError::Closed)
    }

    pub async fn close(mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.close().await {
                warn!("关闭会话失败，强制释放: {}", e);
                session.force_release();
            }
            debug!("会话已关闭");
        }
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            debug!("会话未正常关闭，强制释放");
            session.force_release();
        }
    }
}
