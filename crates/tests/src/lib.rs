//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 表格 -> 协调器 -> 总线 e2e
//! - 协调器 -> 传输 -> 后端 -> 观看端 e2e（本地回环，无外部服务）

#[cfg(test)]
mod contract_tests {
    use contracts::{AnnouncementEvent, RpcFrame};

    #[test]
    fn test_config_version_defaults_and_rejects_unknown() {
        use config_loader::{ConfigFormat, ConfigLoader};

        // 未写 version 的配置按 V1 处理
        let parsed =
            ConfigLoader::load_from_str("[[sources]]\nkind = \"sample\"\n", ConfigFormat::Toml)
                .unwrap();
        assert_eq!(parsed.version, contracts::ConfigVersion::V1);

        let future = "version = \"V2\"\n\n[[sources]]\nkind = \"sample\"\n";
        assert!(ConfigLoader::load_from_str(future, ConfigFormat::Toml).is_err());
    }

    #[test]
    fn test_sample_config_round_trips_through_loader() {
        let config = contracts::AnnouncerConfig::sample_only();
        let toml = config_loader::ConfigLoader::to_toml(&config).unwrap();
        let parsed =
            config_loader::ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml)
                .unwrap();
        assert_eq!(parsed.sources.len(), 1);
        assert_eq!(parsed.server.bind, "0.0.0.0:8000");
    }

    #[test]
    fn test_sample_program_events_encode_for_every_channel() {
        let programs = ingestion::sample_programs();
        let event = AnnouncementEvent::from(programs[1].display_result(0).unwrap());

        let socket = serde_json::to_string(&event).unwrap();
        assert!(socket.contains("\"DISPLAY_RESULT\""));

        let rpc = RpcFrame::request_for(&event).unwrap();
        assert_eq!(rpc.name(), "show_result");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use contracts::{
        AnnouncementEvent, EventKind, ProgramSource, RestSourceConfig, SheetSourceConfig,
        SourceConfig, TransportConfig, TransportKind,
    };
    use coordinator::AnnouncementCoordinator;
    use event_bus::AnnouncementBus;
    use ingestion::{build_chain, SampleSource, SheetOptions, SheetSource};
    use server::{serve_listener, AppState, ServerError};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;
    use transports::{ContextHub, Direction, TransportRegistry, TransportRegistryBuilder};

    const GRID: &str = r#"[
        ["Annual Meet - Results"],
        ["Program", "", "", "Candidates", "", "", "Result", ""],
        ["Code", "Program Name", "Section", "Chest No.", "Name", "Team", "Position", "Grade"],
        ["P1", "Dance Solo", "Senior", "C-101", "Alex Johnson", "Orion", 1, "A"],
        ["", "", "", "C-102", "Bella Smith", "Orion", 2, "-"],
        ["", "", "", "C-103", "Chris Lee", "Orion", 3, "B"],
        ["P2", "Classical Vocal", "Junior", "C-201", "Divya Patel", "Atlas", 1, "A"],
        ["", "", "", "C-202", "Ethan Clark", "Atlas", 2, "A"]
    ]"#;

    type Recorded = Arc<Mutex<Vec<AnnouncementEvent>>>;

    fn write_grid() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(GRID.as_bytes()).unwrap();
        file
    }

    /// Bus whose every event is also appended to the returned log
    fn recording_bus() -> (Arc<AnnouncementBus>, Recorded) {
        let bus = Arc::new(AnnouncementBus::new());
        let recorded: Recorded = Arc::default();
        let sink = Arc::clone(&recorded);
        bus.subscribe_all(move |event| {
            sink.lock().unwrap().push(event.clone());
            Ok(())
        });
        (bus, recorded)
    }

    /// Poll `check` until it holds or two seconds pass
    async fn eventually(what: &str, mut check: impl FnMut() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {what}");
    }

    struct Backend {
        addr: SocketAddr,
        state: AppState<SampleSource>,
        stop: Option<oneshot::Sender<()>>,
        task: JoinHandle<Result<(), ServerError>>,
    }

    impl Backend {
        async fn start() -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let state = AppState::new(SampleSource::new());
            let (stop, stopped) = oneshot::channel::<()>();
            let task = tokio::spawn(serve_listener(listener, state.clone(), async move {
                let _ = stopped.await;
            }));
            Self {
                addr,
                state,
                stop: Some(stop),
                task,
            }
        }

        fn ws(&self, path: &str) -> String {
            format!("ws://{}{}", self.addr, path)
        }

        fn http(&self) -> String {
            format!("http://{}", self.addr)
        }

        async fn stop(mut self) {
            if let Some(stop) = self.stop.take() {
                let _ = stop.send(());
            }
            self.task.await.unwrap().unwrap();
        }
    }

    /// End-to-end test: JSON grid -> SheetSource -> Coordinator -> Bus
    ///
    /// 验证完整的播报流程：
    /// 1. 两行表头 + 合并单元格向下填充
    /// 2. 选择节目、逐条播报
    /// 3. 全部播报后节目标记为已读并排到末尾
    #[tokio::test]
    async fn test_e2e_sheet_announcement_session() {
        let file = write_grid();
        let source = SheetSource::new(file.path(), SheetOptions::default());
        let (bus, recorded) = recording_bus();
        let mut coordinator =
            AnnouncementCoordinator::new(source, bus, TransportRegistry::empty());

        let keys: Vec<String> = coordinator
            .load_programs()
            .await
            .unwrap()
            .iter()
            .map(|p| p.key.to_string())
            .collect();
        assert_eq!(keys, ["P2 - Classical Vocal (Junior)", "P1 - Dance Solo (Senior)"]);

        let selected = coordinator.select("P1 - Dance Solo (Senior)").await.unwrap();
        assert_eq!(selected.results, 3);
        assert_eq!(selected.publish.delivered, 1);

        coordinator.announce(2).unwrap();
        coordinator.announce(0).unwrap();
        let last = coordinator.announce(1).unwrap();
        let completion = last.completed.expect("program completed");
        assert_eq!(completion.key, "P1 - Dance Solo (Senior)");

        // Fill-down 后每条结果都带有节目信息
        let events = recorded.lock().unwrap().clone();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].kind(), EventKind::ProgramSelected);
        assert!(events.iter().all(|e| e.program_name() == "Dance Solo"));
        match &events[3] {
            AnnouncementEvent::ResultSelected(r) => {
                assert_eq!(r.result.name, "Bella Smith");
                assert_eq!(r.result.grade, "");
                assert_eq!(r.result_index, Some(1));
            }
            other => panic!("unexpected event {other:?}"),
        }

        // 已读节目不可再次选择，排在未读节目之后
        assert!(coordinator
            .select("P1 - Dance Solo (Senior)")
            .await
            .unwrap_err()
            .is_rejection());
        let status = coordinator.status();
        assert_eq!(status.unread, 1);
        assert!(status.selection.is_none());
        assert!(coordinator.programs()[1].read);

        coordinator.shutdown().await;
    }

    /// End-to-end test: configured chain falls back past broken sources
    #[tokio::test]
    async fn test_e2e_fallback_chain() {
        let file = write_grid();
        let mut refused = RestSourceConfig::new("http://127.0.0.1:1");
        refused.timeout_ms = 500;

        let chain = build_chain(&[
            SourceConfig::Sheet(SheetSourceConfig::new("/nonexistent/results.json")),
            SourceConfig::Rest(refused),
            SourceConfig::Sheet(SheetSourceConfig::new(file.path())),
            SourceConfig::Sample,
        ])
        .unwrap();

        let programs = chain.list_programs().await.unwrap();
        assert_eq!(programs.len(), 2);

        // 表格中没有的节目由示例数据兜底
        let vocal = chain.fetch_program("prog-200").await.unwrap().unwrap();
        assert_eq!(vocal.results[1].name, "Ethan Clark");
        assert!(chain.fetch_program("missing").await.unwrap().is_none());
    }

    /// End-to-end test: REST source + every network transport against the backend
    ///
    /// 验证：
    /// 1. 播报端通过 REST 拉取节目
    /// 2. remote_socket / rpc_channel / announce_endpoint 三路出站
    /// 3. 观看端通过 remote_socket 入站收到事件
    #[tokio::test]
    async fn test_e2e_announcer_to_viewer_through_backend() {
        let backend = Backend::start().await;

        // 观看端
        let (viewer_bus, viewer_events) = recording_bus();
        let viewer = TransportRegistryBuilder::new(viewer_bus)
            .direction(Direction::Inbound)
            .build(&[TransportConfig::new("screen", TransportKind::RemoteSocket)
                .with_param("url", backend.ws("/ws"))])
            .await;
        assert_eq!(viewer.inbound_names(), ["screen"]);

        // 播报端
        let chain = build_chain(&[SourceConfig::Rest(RestSourceConfig::new(backend.http()))])
            .unwrap();
        let (bus, local_events) = recording_bus();
        let transports = TransportRegistryBuilder::new(Arc::clone(&bus))
            .build(&[
                TransportConfig::new("viewer_ws", TransportKind::RemoteSocket)
                    .with_param("url", backend.ws("/ws")),
                TransportConfig::new("viewer_rpc", TransportKind::RpcChannel)
                    .with_param("url", backend.ws("/rpc")),
                TransportConfig::new("backend", TransportKind::AnnounceEndpoint)
                    .with_param("base_url", backend.http()),
            ])
            .await;
        assert!(transports.failures().is_empty());
        assert_eq!(transports.len(), 3);

        let state = backend.state.clone();
        eventually("socket clients", || state.client_count() >= 3).await;

        let mut coordinator = AnnouncementCoordinator::new(chain, bus, transports);
        let programs = coordinator.load_programs().await.unwrap();
        assert_eq!(programs.len(), 3);
        assert!(programs[2].read);

        let selected = coordinator.select("prog-200").await.unwrap();
        assert_eq!(selected.queued, 3);
        let announced = coordinator.announce(1).unwrap();
        assert_eq!(announced.queued, 3);

        let events = Arc::clone(&viewer_events);
        eventually("viewer to see the result", || {
            events.lock().unwrap().iter().any(|e| match e {
                AnnouncementEvent::ResultSelected(r) => r.result.name == "Ethan Clark",
                AnnouncementEvent::ProgramSelected(_) => false,
            })
        })
        .await;
        assert!(viewer_events
            .lock()
            .unwrap()
            .iter()
            .any(|e| {
                e.kind() == EventKind::ProgramSelected && e.program_name() == "Classical Vocal"
            }));

        // 本地总线只收到自己发布的两条
        assert_eq!(local_events.lock().unwrap().len(), 2);

        let transports = coordinator.transports();
        eventually("every transport to deliver", || {
            transports
                .metrics()
                .iter()
                .all(|(_, m)| m.sent_count == 2 && m.failure_count == 0)
        })
        .await;

        coordinator.shutdown().await;
        viewer.shutdown().await;
        backend.stop().await;
    }

    /// End-to-end test: two contexts of one process sharing a hub
    #[tokio::test]
    async fn test_e2e_cross_context_mirror() {
        let hub = ContextHub::new();
        let tabs = [TransportConfig::new("tabs", TransportKind::CrossContext)];

        let (viewer_bus, viewer_events) = recording_bus();
        let viewer = TransportRegistryBuilder::new(viewer_bus)
            .hub(hub.clone())
            .direction(Direction::Inbound)
            .build(&tabs)
            .await;

        let (bus, local_events) = recording_bus();
        let transports = TransportRegistryBuilder::new(Arc::clone(&bus))
            .hub(hub)
            .direction(Direction::Both)
            .build(&tabs)
            .await;

        let mut coordinator = AnnouncementCoordinator::new(SampleSource::new(), bus, transports);
        coordinator.load_programs().await.unwrap();
        coordinator.select("prog-100").await.unwrap();
        coordinator.announce(0).unwrap();

        let events = Arc::clone(&viewer_events);
        eventually("mirrored events", || events.lock().unwrap().len() == 2).await;
        let mirrored = viewer_events.lock().unwrap().clone();
        assert_eq!(mirrored[0].program_name(), "Dance Solo");
        assert_eq!(mirrored[1].kind(), EventKind::ResultSelected);

        // 自身发出的帧不会回流到本地总线
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(local_events.lock().unwrap().len(), 2);

        coordinator.shutdown().await;
        viewer.shutdown().await;
    }
}
