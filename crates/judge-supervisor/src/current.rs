//! State for whichever submission is presently being graded.

use tokio::net::unix::OwnedWriteHalf;
use tokio::process::Child;
use tokio::sync::Mutex;

pub struct CurrentSubmission {
    pub id: u64,
    pub writer: Mutex<OwnedWriteHalf>,
    pub child: Mutex<Child>,
}
