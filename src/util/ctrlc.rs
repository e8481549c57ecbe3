//! Process-wide ctrl-C / termination hook.
//!
//! Exactly one hook is installable for the lifetime of the process; the
//! signal thread forwards into it.

use once_cell::sync::Lazy;
use parking_lot::Mutex;

type Hook = Box<dyn FnMut() + Send>;

static HOOK: Lazy<Mutex<Option<Hook>>> = Lazy::new(|| Mutex::new(None));

/// Error from [`set_ctrl_c_handler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CtrlCError {
    /// A hook has already been installed
    AlreadyInstalled,
    /// The OS signal handler could not be registered
    SignalRegistration(String),
}

impl std::fmt::Display for CtrlCError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CtrlCError::AlreadyInstalled => write!(f, "ctrl-c hook already installed"),
            CtrlCError::SignalRegistration(e) => {
                write!(f, "failed to register signal handler: {e}")
            }
        }
    }
}

impl std::error::Error for CtrlCError {}

/// Install the process-wide shutdown hook.
pub fn set_ctrl_c_handler<F>(handler: F) -> Result<(), CtrlCError>
where
    F: FnMut() + Send + 'static,
{
    {
        let mut hook = HOOK.lock();
        if hook.is_some() {
            return Err(CtrlCError::AlreadyInstalled);
        }
        *hook = Some(Box::new(handler));
    }

    ::ctrlc::set_handler(|| {
        if let Some(hook) = HOOK.lock().as_mut() {
            hook();
        }
    })
    .map_err(|e| {
        *HOOK.lock() = None;
        CtrlCError::SignalRegistration(e.to_string())
    })
}
