//! Service clock pinned to the metropolitan timezone.
//!
//! Windows, cut-offs and completion stamps are all defined in local Seoul
//! time; handlers take the current instant as a parameter so the usecases
//! stay testable with fixed clocks.

use chrono::{DateTime, Utc};
use chrono_tz::Asia::Seoul;
use chrono_tz::Tz;

/// Current instant in Asia/Seoul.
pub fn now() -> DateTime<Tz> {
    Utc::now().with_timezone(&Seoul)
}
