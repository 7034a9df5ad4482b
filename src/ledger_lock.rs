use std::sync::OnceLock;
use tokio::sync::Mutex;

/// Serialises access to the Ledger over HID.
///
/// The header's status check and a submission can both try to open the
/// device at the same time; concurrent opens fail with HIDAPI errors such as
/// "Overlapped I/O operation is in progress" on Windows.
static LEDGER_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub fn ledger_lock() -> &'static Mutex<()> {
    LEDGER_LOCK.get_or_init(|| Mutex::new(()))
}
