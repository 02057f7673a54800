//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::env;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use teo_provider::{
    ApiTransport, ProviderConfig, ProviderError, Result, RetryPolicy, State, TeoProvider,
};

/// 跳过测试的宏（当环境变量缺失时）
#[macro_export]
macro_rules! skip_if_no_credentials {
    ($($var:expr),+) => {
        $(
            if std::env::var($var).is_err() {
                eprintln!("跳过测试: 缺少环境变量 {}", $var);
                return;
            }
        )+
    };
}

/// 断言 `Option` 为 `Some`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let opt = $expr;
        assert!(opt.is_some(), "{}", format_args!($($msg)+));
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// 生成唯一的测试名称前缀
pub fn generate_test_name() -> String {
    let uuid = uuid::Uuid::new_v4();
    format!("tf-test-{}", &uuid.to_string()[..8])
}

/// JSON 对象转为 [`State`]
pub fn state(value: Value) -> State {
    match value {
        Value::Object(m) => m,
        _ => Map::new(),
    }
}

/// 按 Action 排队应答的离线 Transport，并记录全部请求
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 追加一条成功应答
    pub fn reply(&self, action: &str, response: Value) -> &Self {
        self.push(action, Ok(response));
        self
    }

    /// 追加一条错误应答
    pub fn fail(&self, action: &str, error: ProviderError) -> &Self {
        self.push(action, Err(error));
        self
    }

    fn push(&self, action: &str, reply: Result<Value>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.entry(action.to_string()).or_default().push_back(reply);
        }
    }

    pub fn actions(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|c| c.iter().map(|(a, _)| a.clone()).collect())
            .unwrap_or_default()
    }

    /// 所有发往 `action` 的请求体
    pub fn payloads(&self, action: &str) -> Vec<Value> {
        self.calls
            .lock()
            .map(|c| {
                c.iter()
                    .filter(|(a, _)| a == action)
                    .map(|(_, p)| p.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ApiTransport for MockTransport {
    async fn call(&self, action: &str, payload: Value) -> Result<Value> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((action.to_string(), payload));
        }
        let next = self
            .replies
            .lock()
            .ok()
            .and_then(|mut r| r.get_mut(action).and_then(VecDeque::pop_front));
        next.unwrap_or_else(|| Ok(json!({})))
    }
}

/// 基于 [`MockTransport`] 的 Provider
pub fn mock_provider(transport: &Arc<MockTransport>) -> TeoProvider {
    TeoProvider::with_transport(transport.clone(), RetryPolicy::default())
}

/// 测试上下文 - 封装真实 Provider 和测试站点
pub struct TestContext {
    pub provider: TeoProvider,
    pub zone_id: String,
}

impl TestContext {
    /// 从 `TENCENTCLOUD_*` 环境变量创建
    pub fn teo() -> Option<Self> {
        let zone_id = env::var("TENCENTCLOUD_TEO_ZONE_ID").ok()?;
        let provider = TeoProvider::new(ProviderConfig::from_env()).ok()?;
        Some(Self { provider, zone_id })
    }

    /// 尽力删除，忽略错误
    pub async fn cleanup(&self, type_name: &str, id: &str) {
        let _ = self.provider.delete(type_name, id, Map::new()).await;
    }
}
