use bao::arms::StrategyConfig;
use bao::host::{
    CATALOG_NAMESPACE, CacheInspector, ExecutionTiming, NativePlan, PlannableQuery, QueryPlanner,
    RelationRef, StatementKind,
};
use bao::{BaoSettings, CacheCensus, OperatorKind};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;

/// Parsed query handed to the stub planner
#[derive(Debug, Clone, PartialEq)]
pub struct StubQuery {
    pub kind: StatementKind,
    pub relations: Vec<RelationRef>,
    pub tables: Vec<String>,
}

impl StubQuery {
    /// SELECT over user tables
    #[allow(dead_code)]
    pub fn select(tables: &[&str]) -> Self {
        Self {
            kind: StatementKind::Select,
            relations: tables
                .iter()
                .enumerate()
                .map(|(i, _)| RelationRef::new(16384 + i as u32, "public"))
                .collect(),
            tables: tables.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    /// SELECT touching only catalog relations
    #[allow(dead_code)]
    pub fn catalog() -> Self {
        Self {
            kind: StatementKind::Select,
            relations: vec![RelationRef::new(1259, CATALOG_NAMESPACE)],
            tables: vec!["pg_class".to_string()],
        }
    }

    #[allow(dead_code)]
    pub fn insert(table: &str) -> Self {
        Self {
            kind: StatementKind::Insert,
            relations: vec![RelationRef::new(16384, "public")],
            tables: vec![table.to_string()],
        }
    }
}

impl PlannableQuery for StubQuery {
    fn statement_kind(&self) -> StatementKind {
        self.kind
    }

    fn relations(&self) -> Vec<RelationRef> {
        self.relations.clone()
    }
}

/// Native plan node produced by the stub planner; remembers the strategy it was planned under
#[derive(Debug, Clone, PartialEq)]
pub struct StubPlan {
    pub tag: u32,
    pub cost: f64,
    pub rows: f64,
    pub relation: Option<String>,
    pub children: Vec<StubPlan>,
    pub strategy: StrategyConfig,
}

impl NativePlan for StubPlan {
    fn node_tag(&self) -> u32 {
        self.tag
    }

    fn total_cost(&self) -> f64 {
        self.cost
    }

    fn plan_rows(&self) -> f64 {
        self.rows
    }

    fn relation_name(&self) -> Option<&str> {
        self.relation.as_deref()
    }

    fn children(&self) -> Vec<&Self> {
        self.children.iter().collect()
    }
}

#[derive(Debug)]
pub struct StubPlannerError(pub String);

impl fmt::Display for StubPlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stub planner failed: {}", self.0)
    }
}

impl std::error::Error for StubPlannerError {}

/// Distinct cost for every distinct strategy configuration
#[allow(dead_code)]
pub fn strategy_cost(strategy: &StrategyConfig) -> f64 {
    let flags = [
        strategy.hash_join,
        strategy.merge_join,
        strategy.nested_loop,
        strategy.index_scan,
        strategy.seq_scan,
        strategy.index_only_scan,
    ];
    let bits = flags
        .iter()
        .enumerate()
        .filter(|(_, on)| **on)
        .map(|(i, _)| 1u32 << i)
        .sum::<u32>();
    100.0 + f64::from(bits)
}

/// Planner that builds a small plan shaped by the strategy flags and logs every call
#[derive(Default)]
pub struct StubPlanner {
    pub calls: RefCell<Vec<StrategyConfig>>,
    pub fail_on_call: Option<usize>,
    pub wide_root: bool,
}

impl StubPlanner {
    #[allow(dead_code)]
    pub fn failing_on_call(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }

    #[allow(dead_code)]
    pub fn with_wide_root() -> Self {
        Self {
            wide_root: true,
            ..Self::default()
        }
    }

    #[allow(dead_code)]
    pub fn strategies(&self) -> Vec<StrategyConfig> {
        self.calls.borrow().clone()
    }

    fn scan(table: &str, strategy: StrategyConfig) -> StubPlan {
        let tag = if strategy.seq_scan {
            OperatorKind::SEQ_SCAN_TAG
        } else if strategy.index_scan {
            OperatorKind::INDEX_SCAN_TAG
        } else {
            OperatorKind::INDEX_ONLY_SCAN_TAG
        };
        StubPlan {
            tag,
            cost: strategy_cost(&strategy) / 2.0,
            rows: 1000.0,
            relation: Some(table.to_string()),
            children: vec![],
            strategy,
        }
    }
}

impl QueryPlanner for StubPlanner {
    type Query = StubQuery;
    type Params = ();
    type Plan = StubPlan;
    type Error = StubPlannerError;

    fn plan(
        &self,
        query: StubQuery,
        _params: &(),
        strategy: StrategyConfig,
    ) -> Result<StubPlan, StubPlannerError> {
        let call = {
            let mut calls = self.calls.borrow_mut();
            calls.push(strategy);
            calls.len() - 1
        };
        if self.fail_on_call == Some(call) {
            return Err(StubPlannerError(format!("call {call}")));
        }

        let mut scans: Vec<StubPlan> = query
            .tables
            .iter()
            .map(|table| Self::scan(table, strategy))
            .collect();

        if self.wide_root {
            return Ok(StubPlan {
                tag: 104,
                cost: strategy_cost(&strategy),
                rows: 3000.0,
                relation: None,
                children: scans,
                strategy,
            });
        }

        if scans.len() < 2 {
            return scans
                .pop()
                .ok_or_else(|| StubPlannerError("no tables".to_string()));
        }

        let tag = if strategy.hash_join {
            OperatorKind::HASH_JOIN_TAG
        } else if strategy.merge_join {
            OperatorKind::MERGE_JOIN_TAG
        } else {
            OperatorKind::NESTED_LOOP_TAG
        };
        scans.truncate(2);
        Ok(StubPlan {
            tag,
            cost: strategy_cost(&strategy),
            rows: 500.0,
            relation: None,
            children: scans,
            strategy,
        })
    }
}

/// Cache with a fixed census that counts how often it was asked
#[derive(Default)]
pub struct StubCache {
    pub census: CacheCensus,
    pub requests: Cell<usize>,
}

impl StubCache {
    #[allow(dead_code)]
    pub fn with_blocks(entries: &[(&str, u64)]) -> Self {
        Self {
            census: entries.iter().map(|(name, count)| (*name, *count)).collect(),
            requests: Cell::new(0),
        }
    }
}

impl CacheInspector for StubCache {
    fn census(&self) -> CacheCensus {
        self.requests.set(self.requests.get() + 1);
        self.census.clone()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StubTiming {
    pub executed: bool,
    pub instrumented: bool,
    pub elapsed_ms: Option<f64>,
}

impl StubTiming {
    #[allow(dead_code)]
    pub fn finished(elapsed_ms: f64) -> Self {
        Self {
            executed: true,
            instrumented: false,
            elapsed_ms: Some(elapsed_ms),
        }
    }
}

impl ExecutionTiming for StubTiming {
    fn already_executed(&self) -> bool {
        self.executed
    }

    fn instrumented(&self) -> bool {
        self.instrumented
    }

    fn elapsed_ms(&self) -> Option<f64> {
        self.elapsed_ms
    }
}

/// How the stub decision service answers
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Answer query exchanges with `arm` and predict exchanges with `prediction`
    Answer { arm: u32, prediction: f64 },
    /// Send these bytes to query and predict exchanges
    Raw(Vec<u8>),
    /// Close without answering
    HangUp,
}

/// One exchange as seen by the stub service
#[derive(Debug, Clone)]
pub struct RecordedExchange {
    pub kind: String,
    /// Documents between the opening tag and the terminal tag
    pub bodies: Vec<Value>,
    pub terminated: bool,
}

/// Decision service stand-in running on its own tokio runtime
pub struct StubService {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<RecordedExchange>>>,
    _runtime: Runtime,
}

impl StubService {
    #[allow(dead_code)]
    pub fn answering(arm: u32, prediction: f64) -> Self {
        Self::start(Behavior::Answer { arm, prediction })
    }

    pub fn start(behavior: Behavior) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_io()
            .build()
            .expect("Failed to build stub service runtime");
        let listener = runtime
            .block_on(TcpListener::bind("127.0.0.1:0"))
            .expect("Failed to bind stub service");
        let addr = listener.local_addr().expect("Stub service has no address");
        let received = Arc::new(Mutex::new(Vec::new()));

        let log = received.clone();
        runtime.spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let log = log.clone();
                let behavior = behavior.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    if stream.read_to_end(&mut buf).await.is_err() {
                        return;
                    }

                    let exchange = parse_exchange(&buf);
                    let reply = match (&behavior, exchange.kind.as_str()) {
                        (Behavior::Answer { arm, .. }, "query") => arm.to_ne_bytes().to_vec(),
                        (Behavior::Answer { prediction, .. }, "predict") => {
                            prediction.to_ne_bytes().to_vec()
                        }
                        (Behavior::Raw(bytes), "query" | "predict") => bytes.clone(),
                        _ => vec![],
                    };
                    log.lock().unwrap().push(exchange);

                    if !reply.is_empty() {
                        let _ = stream.write_all(&reply).await;
                    }
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self {
            addr,
            received,
            _runtime: runtime,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Settings with optimization on, pointed at this service
    #[allow(dead_code)]
    pub fn settings(&self) -> BaoSettings {
        BaoSettings {
            enable_bao: true,
            host: "127.0.0.1".to_string(),
            port: self.port(),
            ..BaoSettings::default()
        }
    }

    #[allow(dead_code)]
    pub fn client(&self) -> bao::ProtocolClient {
        bao::ProtocolClient::new("127.0.0.1", self.port())
    }

    /// Exchanges recorded so far
    #[allow(dead_code)]
    pub fn exchanges(&self) -> Vec<RecordedExchange> {
        self.received.lock().unwrap().clone()
    }

    /// Wait until at least `count` exchanges were recorded
    #[allow(dead_code)]
    pub fn wait_for(&self, count: usize) -> Vec<RecordedExchange> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let exchanges = self.exchanges();
            if exchanges.len() >= count || Instant::now() > deadline {
                return exchanges;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}

fn parse_exchange(buf: &[u8]) -> RecordedExchange {
    let text = String::from_utf8_lossy(buf);
    let mut documents: Vec<Value> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).unwrap_or(Value::Null))
        .collect();

    let terminated = documents.last().is_some_and(|doc| doc["final"] == true);
    if terminated {
        documents.pop();
    }
    let kind = if documents.is_empty() {
        String::new()
    } else {
        documents
            .remove(0)
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    RecordedExchange {
        kind,
        bodies: documents,
        terminated,
    }
}

/// Settings pointed at a port nothing listens on
#[allow(dead_code)]
pub fn unreachable_settings() -> BaoSettings {
    BaoSettings {
        enable_bao: true,
        host: "127.0.0.1".to_string(),
        port: unused_port(),
        ..BaoSettings::default()
    }
}

#[allow(dead_code)]
pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
