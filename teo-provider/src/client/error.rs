//! 腾讯云错误码映射
//! Reference: <https://cloud.tencent.com/document/api/1552/80731>

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::TencentCloudClient;

impl ProviderErrorMapper for TencentCloudClient {
    fn service_name(&self) -> &'static str {
        self.service
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let Some(code) = raw.code.clone() else {
            return self.unknown_error(raw, context);
        };
        // 公共错误码按一级前缀归类，例如 ResourceNotFound.ZoneNotFound
        let category = code.split('.').next().unwrap_or_default().to_string();
        let action = context.action.clone();

        match category.as_str() {
            // ============ 鉴权失败 ============
            "AuthFailure" => ProviderError::InvalidCredentials {
                action,
                raw_code: Some(code),
                raw_message: Some(raw.message),
            },

            // ============ 权限不足 ============
            "UnauthorizedOperation" | "OperationDenied" => ProviderError::PermissionDenied {
                action,
                raw_code: Some(code),
                raw_message: Some(raw.message),
            },

            // ============ 资源不存在 ============
            "ResourceNotFound" => ProviderError::ResourceNotFound {
                action,
                raw_code: code,
                raw_message: raw.message,
            },

            // ============ 参数错误 ============
            "InvalidParameter" | "InvalidParameterValue" | "MissingParameter"
            | "UnknownParameter" | "InvalidAction" => ProviderError::InvalidParameter {
                action,
                raw_code: code,
                raw_message: raw.message,
            },

            // ============ 配额（不可重试） ============
            "LimitExceeded" => ProviderError::QuotaExceeded {
                action,
                raw_code: code,
                raw_message: raw.message,
            },

            // ============ 频率限制（可重试） ============
            "RequestLimitExceeded" => ProviderError::RateLimited {
                action,
                retry_after: None,
                raw_code: Some(code),
                raw_message: Some(raw.message),
            },

            "ResourceInUse" => ProviderError::ResourceInUse {
                action,
                raw_code: code,
                raw_message: raw.message,
            },

            "FailedOperation" => ProviderError::OperationFailed {
                action,
                raw_code: code,
                raw_message: raw.message,
            },

            // ============ 服务端暂时不可用 ============
            "InternalError" | "ResourceUnavailable" | "ResourceInsufficient" | "ResourceBusy"
            | "TradeUnknownError" => ProviderError::ServiceUnavailable {
                action,
                raw_code: code,
                raw_message: raw.message,
            },

            _ => self.unknown_error(raw, context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TencentCloudClient {
        let built = TencentCloudClient::builder("", "").build();
        let Ok(client) = built else {
            panic!("client should build")
        };
        client
    }

    fn map(code: &str) -> ProviderError {
        client().map_error(
            RawApiError::with_code(code, "message"),
            ErrorContext::action("DescribeZones"),
        )
    }

    #[test]
    fn auth_failure_maps_to_invalid_credentials() {
        for code in [
            "AuthFailure",
            "AuthFailure.SecretIdNotFound",
            "AuthFailure.SignatureExpire",
        ] {
            let err = map(code);
            assert!(
                matches!(err, ProviderError::InvalidCredentials { .. }),
                "expected InvalidCredentials for code '{code}', got {err:?}"
            );
        }
    }

    #[test]
    fn permission_codes() {
        assert!(matches!(
            map("UnauthorizedOperation.CamUnauthorized"),
            ProviderError::PermissionDenied { .. }
        ));
        assert!(matches!(
            map("OperationDenied"),
            ProviderError::PermissionDenied { .. }
        ));
    }

    #[test]
    fn not_found_keeps_raw_code() {
        let err = map("ResourceNotFound.ZoneNotFound");
        assert!(
            matches!(&err, ProviderError::ResourceNotFound { raw_code, action, .. }
                if raw_code == "ResourceNotFound.ZoneNotFound" && action == "DescribeZones"),
            "got {err:?}"
        );
    }

    #[test]
    fn parameter_codes() {
        for code in [
            "InvalidParameter.ZoneNameInvalid",
            "InvalidParameterValue",
            "MissingParameter",
            "UnknownParameter",
        ] {
            assert!(
                matches!(map(code), ProviderError::InvalidParameter { .. }),
                "{code}"
            );
        }
    }

    #[test]
    fn quota_versus_rate_limit() {
        assert!(matches!(
            map("LimitExceeded.PackNotAllow"),
            ProviderError::QuotaExceeded { .. }
        ));
        assert!(matches!(
            map("RequestLimitExceeded"),
            ProviderError::RateLimited { .. }
        ));
    }

    #[test]
    fn transient_backend_codes() {
        for code in [
            "InternalError",
            "InternalError.ProxyServer",
            "ResourceUnavailable",
            "ResourceBusy",
            "TradeUnknownError",
        ] {
            assert!(
                matches!(map(code), ProviderError::ServiceUnavailable { .. }),
                "{code}"
            );
        }
        assert!(matches!(
            map("FailedOperation.ConfigLocked"),
            ProviderError::OperationFailed { .. }
        ));
        assert!(matches!(
            map("ResourceInUse.ZoneDuplicate"),
            ProviderError::ResourceInUse { .. }
        ));
    }

    #[test]
    fn unknown_fallback() {
        let err = map("UnsupportedOperation");
        assert!(
            matches!(&err, ProviderError::Unknown { raw_code: Some(c), .. } if c == "UnsupportedOperation"),
            "got {err:?}"
        );

        let err = client().map_error(RawApiError::new("no code"), ErrorContext::action("X"));
        assert!(matches!(err, ProviderError::Unknown { raw_code: None, .. }));
    }
}
