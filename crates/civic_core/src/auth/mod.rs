use crate::error::{AppError, NOT_AUTHORIZED};

/// Proof that the caller acted as an administrator.
///
/// The engine never decides who is an admin. The host checks its own admin flag once at
/// the boundary and hands this token to admin-only operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminCapability {
    _private: (),
}

impl AdminCapability {
    pub fn from_flag(is_admin: bool) -> Result<Self, AppError> {
        if is_admin {
            Ok(Self { _private: () })
        } else {
            Err(AppError::new(
                NOT_AUTHORIZED,
                "Admin access is required for this operation",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_admin_flag_is_refused() {
        let err = AdminCapability::from_flag(false).unwrap_err();
        assert_eq!(err.code, NOT_AUTHORIZED);
        assert!(AdminCapability::from_flag(true).is_ok());
    }
}
