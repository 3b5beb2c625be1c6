//! Announcer 指标收集模块
//!
//! 基于 `metrics` facade 记录摄取、总线、传输和数据源的运行指标，
//! 并提供会话级内存聚合器用于输出摘要。

use std::collections::HashMap;
use std::time::Duration;

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};

/// 向导出器注册指标说明，安装 Prometheus recorder 后调用
pub fn describe_metrics() {
    describe_counter!("announcer_rows_ingested_total", "Data rows read from results sheets");
    describe_counter!("announcer_rows_skipped_total", "Separator rows skipped during ingestion");
    describe_counter!("announcer_rows_malformed_total", "Rows dropped as malformed");
    describe_gauge!("announcer_programs_loaded", "Programs in the last loaded list");
    describe_counter!(
        "announcer_source_fallbacks_total",
        "Source failures that fell back to the next source"
    );
    describe_counter!("announcer_bus_publish_total", "Events published on the local bus");
    describe_histogram!("announcer_bus_handlers", "Handlers reached per publish");
    describe_counter!("announcer_bus_handler_faults_total", "Bus handlers that failed or panicked");
    describe_counter!(
        "announcer_transport_notices_total",
        "Outbound notices by transport and status"
    );
    describe_counter!(
        "announcer_transport_dropped_total",
        "Notices dropped on a full transport queue"
    );
    describe_histogram!(
        "announcer_transport_send_latency_ms",
        Unit::Milliseconds,
        "Outbound send latency"
    );
    describe_counter!(
        "announcer_inbound_messages_total",
        "Display events received from transports"
    );
    describe_counter!(
        "announcer_inbound_rejected_total",
        "Inbound frames that could not be parsed"
    );
}

/// 记录表格摄取结果
///
/// 每次解析完一张表格调用一次。
pub fn record_rows_ingested(source: &str, rows: usize, skipped: usize, malformed: usize) {
    counter!("announcer_rows_ingested_total", "source" => source.to_string())
        .increment(rows as u64);
    if skipped > 0 {
        counter!("announcer_rows_skipped_total", "source" => source.to_string())
            .increment(skipped as u64);
    }
    if malformed > 0 {
        counter!("announcer_rows_malformed_total", "source" => source.to_string())
            .increment(malformed as u64);
    }
}

/// 记录节目列表大小
pub fn record_programs_loaded(source: &str, count: usize) {
    gauge!("announcer_programs_loaded", "source" => source.to_string()).set(count as f64);
}

/// 记录数据源回退
pub fn record_source_fallback(failed_source: &str) {
    counter!(
        "announcer_source_fallbacks_total",
        "source" => failed_source.to_string()
    )
    .increment(1);
}

/// 记录总线发布
pub fn record_bus_publish(kind: &str, handlers: usize) {
    counter!("announcer_bus_publish_total", "kind" => kind.to_string()).increment(1);
    histogram!("announcer_bus_handlers", "kind" => kind.to_string()).record(handlers as f64);
}

/// 记录订阅者处理失败 (返回错误或 panic)
pub fn record_handler_fault(kind: &str) {
    counter!("announcer_bus_handler_faults_total", "kind" => kind.to_string()).increment(1);
}

/// 记录出站通知结果
pub fn record_transport_notice(transport: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "announcer_transport_notices_total",
        "transport" => transport.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录队列满被丢弃的通知
pub fn record_transport_dropped(transport: &str) {
    counter!(
        "announcer_transport_dropped_total",
        "transport" => transport.to_string()
    )
    .increment(1);
}

/// 记录单次出站发送耗时
pub fn record_transport_latency_ms(transport: &str, latency_ms: f64) {
    histogram!(
        "announcer_transport_send_latency_ms",
        "transport" => transport.to_string()
    )
    .record(latency_ms);
}

/// 记录入站消息
pub fn record_inbound_message(transport: &str, kind: &str) {
    counter!(
        "announcer_inbound_messages_total",
        "transport" => transport.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// 记录无法解析的入站消息
pub fn record_inbound_rejected(transport: &str) {
    counter!(
        "announcer_inbound_rejected_total",
        "transport" => transport.to_string()
    )
    .increment(1);
}

/// 会话指标聚合器
///
/// 在内存中聚合一次播报会话的指标，便于退出时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct SessionMetricsAggregator {
    /// 选中节目次数
    pub programs_selected: u64,

    /// 播报结果次数 (含重复播报)
    pub results_announced: u64,

    /// 播报完毕的节目数
    pub programs_completed: u64,

    /// 被拒绝的操作数
    pub rejected_actions: u64,

    /// 节目从选中到播报完毕的耗时
    pub completion_times: CompletionTimes,

    /// 各 transport 的 (成功, 失败, 丢弃)
    pub transport_counts: HashMap<String, (u64, u64, u64)>,
}

impl SessionMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_selection(&mut self) {
        self.programs_selected += 1;
    }

    pub fn record_announcement(&mut self) {
        self.results_announced += 1;
    }

    /// 节目播报完毕
    pub fn record_completion(&mut self, elapsed: Duration) {
        self.programs_completed += 1;
        self.completion_times.push(elapsed);
    }

    pub fn record_rejection(&mut self) {
        self.rejected_actions += 1;
    }

    /// 覆盖某个 transport 的累计计数
    pub fn set_transport_counts(&mut self, transport: &str, sent: u64, failed: u64, dropped: u64) {
        self.transport_counts
            .insert(transport.to_string(), (sent, failed, dropped));
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let notices: u64 = self.transport_counts.values().map(|(s, f, _)| s + f).sum();
        let failures: u64 = self.transport_counts.values().map(|(_, f, _)| f).sum();
        MetricsSummary {
            programs_selected: self.programs_selected,
            results_announced: self.results_announced,
            programs_completed: self.programs_completed,
            rejected_actions: self.rejected_actions,
            transport_failure_rate: if notices > 0 {
                failures as f64 / notices as f64 * 100.0
            } else {
                0.0
            },
            completion_times: self.completion_times,
            transport_counts: self.transport_counts.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub programs_selected: u64,
    pub results_announced: u64,
    pub programs_completed: u64,
    pub rejected_actions: u64,
    pub transport_failure_rate: f64,
    pub completion_times: CompletionTimes,
    pub transport_counts: HashMap<String, (u64, u64, u64)>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Announcement Session Summary ===")?;
        writeln!(f, "Programs selected: {}", self.programs_selected)?;
        writeln!(f, "Results announced: {}", self.results_announced)?;
        writeln!(f, "Programs completed: {}", self.programs_completed)?;
        writeln!(f, "Rejected actions: {}", self.rejected_actions)?;
        writeln!(
            f,
            "Transport failure rate: {:.2}%",
            self.transport_failure_rate
        )?;
        writeln!(f, "Time to complete: {}", self.completion_times)?;

        if !self.transport_counts.is_empty() {
            let mut names: Vec<_> = self.transport_counts.keys().collect();
            names.sort();
            writeln!(f, "Transports (sent/failed/dropped):")?;
            for name in names {
                let (sent, failed, dropped) = self.transport_counts[name];
                writeln!(f, "  {}: {}/{}/{}", name, sent, failed, dropped)?;
            }
        }

        Ok(())
    }
}

/// 节目完成耗时统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionTimes {
    count: u32,
    total: Duration,
    fastest: Option<Duration>,
    slowest: Option<Duration>,
}

impl CompletionTimes {
    pub fn push(&mut self, elapsed: Duration) {
        self.count += 1;
        self.total += elapsed;
        self.fastest = Some(self.fastest.map_or(elapsed, |d| d.min(elapsed)));
        self.slowest = Some(self.slowest.map_or(elapsed, |d| d.max(elapsed)));
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn mean(&self) -> Option<Duration> {
        (self.count > 0).then(|| self.total / self.count)
    }

    pub fn fastest(&self) -> Option<Duration> {
        self.fastest
    }

    pub fn slowest(&self) -> Option<Duration> {
        self.slowest
    }
}

impl std::fmt::Display for CompletionTimes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.mean(), self.fastest, self.slowest) {
            (Some(mean), Some(fastest), Some(slowest)) => write!(
                f,
                "mean {:.1}s, fastest {:.1}s, slowest {:.1}s (n={})",
                mean.as_secs_f64(),
                fastest.as_secs_f64(),
                slowest.as_secs_f64(),
                self.count
            ),
            _ => write!(f, "N/A"),
        }
    }
}
