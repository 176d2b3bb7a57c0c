use stockdb_core::store::error::StoreError;

/// 连接层面的故障：建立连接、池耗尽、I/O 与 TLS。
fn is_connection_failure(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

pub(crate) fn connection_err(e: sqlx::Error) -> StoreError {
    StoreError::Connection(e.to_string())
}

pub(crate) fn write_err(e: sqlx::Error) -> StoreError {
    if is_connection_failure(&e) {
        StoreError::Connection(e.to_string())
    } else {
        StoreError::Write(e.to_string())
    }
}

pub(crate) fn read_err(e: sqlx::Error) -> StoreError {
    if is_connection_failure(&e) {
        StoreError::Connection(e.to_string())
    } else {
        StoreError::Read(e.to_string())
    }
}

pub(crate) fn init_err(e: sqlx::Error) -> StoreError {
    if is_connection_failure(&e) {
        StoreError::Connection(e.to_string())
    } else {
        StoreError::Init(e.to_string())
    }
}

/// `COUNT(*)` 结果转为无符号计数。
pub(crate) fn row_count(n: i64) -> Result<u64, StoreError> {
    u64::try_from(n).map_err(|e| StoreError::Read(format!("invalid row count {n}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_failures_are_not_connection_errors() {
        // BEGIN 失败（例如库被锁）与语句失败同样归为写入错误
        assert!(matches!(
            write_err(sqlx::Error::Protocol("database is locked".to_string())),
            StoreError::Write(_)
        ));
        assert!(matches!(write_err(sqlx::Error::RowNotFound), StoreError::Write(_)));
        assert!(matches!(read_err(sqlx::Error::RowNotFound), StoreError::Read(_)));
    }

    #[test]
    fn test_transport_failures_are_connection_errors() {
        assert!(write_err(sqlx::Error::PoolTimedOut).is_connection());
        assert!(write_err(sqlx::Error::PoolClosed).is_connection());
        assert!(read_err(sqlx::Error::Io(std::io::Error::other("reset"))).is_connection());
        assert!(init_err(sqlx::Error::WorkerCrashed).is_connection());
    }

    #[test]
    fn test_row_count() {
        assert_eq!(row_count(42).unwrap(), 42);
        assert!(matches!(row_count(-1), Err(StoreError::Read(_))));
    }
}
