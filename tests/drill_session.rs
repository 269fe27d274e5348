//! Integration tests for chart sessions: drill-down, cross-filtering and
//! last-transition-wins, with the engine as the transport

mod common;

use common::{engine_with, engine_with_config, row, where_clause, RecordingRunner};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use bizquery::drill::{
    ChartConfig, ChartSession, ClickedItem, CrossFilterConfig, CrossFilterOutcome, DrillConfig, DrillLevelConfig,
    FilterState, FilterStore, QueryTransport,
};
use bizquery::query::DataQuery;
use bizquery::{EngineConfig, FilterPolicy};

fn level(label: &str, dimension: &str) -> DrillLevelConfig {
    DrillLevelConfig {
        label: Some(label.to_string()),
        dimension: Some(dimension.to_string()),
        ..Default::default()
    }
}

fn payables_chart() -> ChartConfig {
    ChartConfig {
        data_query: DataQuery {
            model: "financeiro.contas_pagar".into(),
            dimension: Some("fornecedor".into()),
            measure: Some("valor_total".into()),
            ..Default::default()
        },
        drill: DrillConfig {
            enabled: true,
            levels: vec![
                level("Fornecedor", "fornecedor"),
                level("Filial", "filial"),
                level("Departamento", "departamento"),
                level("Projeto", "projeto"),
            ],
        },
        interaction: CrossFilterConfig::default(),
    }
}

fn session(runner: Arc<RecordingRunner>, chart: ChartConfig, filters: FilterStore) -> ChartSession {
    let transport: Arc<dyn QueryTransport> = Arc::new(engine_with(runner));
    ChartSession::new(chart, filters, transport).unwrap()
}

#[tokio::test]
async fn test_drill_down_then_up() {
    let runner = Arc::new(RecordingRunner::new(vec![row(json!({"label": "Acme", "total": 1, "key": 12}))]));
    let chart = session(runner.clone(), payables_chart(), FilterStore::default());

    let first = chart.refresh().await.unwrap().unwrap();
    assert_eq!(first.level_index, 0);
    assert_eq!(first.breadcrumb, "Fornecedor");

    chart.click(&ClickedItem::keyed(12, "Acme")).await.unwrap();
    chart.click(&ClickedItem::keyed(3, "Matriz")).await.unwrap();
    chart.click(&ClickedItem::labeled("Janeiro")).await.unwrap();
    assert_eq!(chart.level_index().await, 3);
    assert_eq!(chart.path().await.len(), 3);

    let snapshot = chart.drill_up().await.unwrap().unwrap();
    assert_eq!(snapshot.level_index, 2);
    assert_eq!(chart.path().await.len(), 2);
    assert_eq!(snapshot.breadcrumb, "Fornecedor: Acme > Filial: Matriz > Departamento");

    // one request per transition
    let calls = runner.calls();
    assert_eq!(calls.len(), 5);

    let last = calls.last().unwrap();
    assert!(last.sql.contains("COALESCE(dep.nome,'Sem departamento') AS label"));
    let clause = where_clause(&last.sql);
    assert!(clause.contains("cp.filial_id = $"));
    assert!(clause.contains("cp.fornecedor_id = $"));
    assert!(last.params.contains(&json!(12)));
    assert!(last.params.contains(&json!(3)));
    assert!(!last.params.contains(&json!("Janeiro")));
}

#[tokio::test]
async fn test_reset_returns_to_first_level() {
    let runner = Arc::new(RecordingRunner::new(vec![]));
    let chart = session(runner.clone(), payables_chart(), FilterStore::default());

    chart.click(&ClickedItem::keyed(12, "Acme")).await.unwrap();
    let snapshot = chart.reset().await.unwrap().unwrap();
    assert_eq!(snapshot.level_index, 0);
    assert!(chart.path().await.is_empty());

    let last = runner.last_call();
    assert!(last.sql.contains("COALESCE(f.nome_fantasia,'Sem fornecedor') AS label"));
    assert!(!last.params.contains(&json!(12)));
}

#[tokio::test(start_paused = true)]
async fn test_last_transition_wins() {
    let runner = Arc::new(RecordingRunner::delayed(
        vec![row(json!({"label": "x", "total": 1}))],
        Duration::from_millis(200),
    ));
    let chart = session(runner.clone(), payables_chart(), FilterStore::default());

    let clicked = ClickedItem::keyed(12, "Acme");
    let (first, second) = tokio::join!(
        chart.click(&clicked),
        chart.drill_up(),
    );

    // the drill-up superseded the click's request
    assert!(first.unwrap().snapshot.is_none());
    let second = second.unwrap().unwrap();
    assert_eq!(second.level_index, 0);
    assert_eq!(chart.latest().await, Some(second));
    assert_eq!(runner.calls().len(), 2);
}

#[tokio::test]
async fn test_cross_filter_feeds_other_charts() {
    let runner = Arc::new(RecordingRunner::new(vec![]));
    let store = FilterStore::new(FilterState::default());

    let mut source_chart = payables_chart();
    source_chart.drill.enabled = false;
    let by_supplier = session(runner.clone(), source_chart, store.clone());

    let by_branch = session(
        runner.clone(),
        ChartConfig {
            data_query: DataQuery {
                model: "financeiro.contas_pagar".into(),
                dimension: Some("filial".into()),
                ..Default::default()
            },
            drill: DrillConfig {
                enabled: false,
                levels: vec![],
            },
            interaction: CrossFilterConfig::default(),
        },
        store.clone(),
    );

    let outcome = by_supplier.click(&ClickedItem::keyed(12, "Acme")).await.unwrap();
    assert_eq!(
        outcome.cross_filter,
        CrossFilterOutcome::Set {
            key: "fornecedor_id".into(),
            value: json!(12)
        }
    );
    assert!(!outcome.drilled);
    assert!(outcome.snapshot.is_some());

    by_branch.refresh().await.unwrap();
    let last = runner.last_call();
    assert!(last.sql.contains("COALESCE(fil.nome,'Sem filial') AS label"));
    assert!(where_clause(&last.sql).contains("cp.fornecedor_id = $1"));
    assert_eq!(last.params[0], json!(12));

    // second click on the same item clears the shared filter
    let outcome = by_supplier.click(&ClickedItem::keyed(12, "Acme")).await.unwrap();
    assert_eq!(outcome.cross_filter, CrossFilterOutcome::Cleared { key: "fornecedor_id".into() });
    assert!(store.snapshot().await.get("fornecedor_id").is_none());
}

#[tokio::test]
async fn test_shared_date_range_applies() {
    let runner = Arc::new(RecordingRunner::new(vec![]));
    let store = FilterStore::default();
    store
        .update(|s| s.set_date_range(Some("2024-01-01".into()), Some("2024-01-31".into())))
        .await;
    let chart = session(runner.clone(), payables_chart(), store);

    chart.refresh().await.unwrap();
    let last = runner.last_call();
    let clause = where_clause(&last.sql);
    assert!(clause.contains("cp.data_vencimento >= $"));
    assert!(clause.contains("cp.data_vencimento <= $"));
    assert!(last.params.contains(&json!("2024-01-01")));
}

#[tokio::test]
async fn test_undeclared_drill_field_is_skipped_under_strict_policy() {
    let runner = Arc::new(RecordingRunner::new(vec![]));
    let config = EngineConfig {
        filter_policy: FilterPolicy::Strict,
        ..Default::default()
    };
    let transport: Arc<dyn QueryTransport> = Arc::new(engine_with_config(runner.clone(), config));

    let store = FilterStore::default();
    store.update(|s| s.set("cliente_id", json!(5))).await;

    let mut chart = payables_chart();
    chart.drill.levels[0].filter_field = Some("territorio_id".into());
    let session = ChartSession::new(chart, store, transport).unwrap();

    let outcome = session.click(&ClickedItem::keyed(12, "Acme")).await.unwrap();
    assert!(outcome.drilled);
    let snapshot = outcome.snapshot.unwrap();
    assert_eq!(snapshot.level_index, 1);
    assert_eq!(snapshot.breadcrumb, "Fornecedor: Acme > Filial");

    let last = runner.last_call();
    assert!(last.sql.contains("COALESCE(fil.nome,'Sem filial') AS label"));
    assert!(!last.sql.contains("territorio"));
    assert!(!last.params.contains(&json!(12)));
    assert!(!last.params.contains(&json!(5)));
}
