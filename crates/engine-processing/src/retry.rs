use engine_core::{error::StoreError, retry::RetryDisposition};

pub fn classify_store_error(err: &StoreError) -> RetryDisposition {
    match err {
        StoreError::Unavailable(_)
        | StoreError::Throttled(_)
        | StoreError::Aborted(_)
        | StoreError::Timeout(_) => RetryDisposition::Retry,
        StoreError::Rejected { .. } => RetryDisposition::Stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::error::RejectCode;
    use std::time::Duration;

    #[test]
    fn only_rejections_stop() {
        for err in [
            StoreError::Unavailable("down".into()),
            StoreError::Throttled("slow down".into()),
            StoreError::Aborted("lock conflict".into()),
            StoreError::Timeout(Duration::from_secs(1)),
        ] {
            assert_eq!(classify_store_error(&err), RetryDisposition::Retry, "{err}");
        }

        let rejected = StoreError::rejected(0, RejectCode::AlreadyExists, "dup");
        assert_eq!(classify_store_error(&rejected), RetryDisposition::Stop);
    }
}
