//! One function per subcommand. Each returns the text to print.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use apimine_analysis::export::to_dot;
use apimine_analysis::harvest::{CollectionFileSource, Harvester, SampleSource};
use apimine_analysis::search::{self, QueryBuilder};
use apimine_analysis::{Collection, History, Pipeline};
use apimine_core::errors::ErrorCode;
use apimine_core::tracing::metrics;
use apimine_core::MinerContext;
use serde_json::{json, Map, Value};

use crate::error::CliError;

fn load(path: &Path, context: &Arc<MinerContext>) -> Result<Collection, CliError> {
    Ok(Collection::load(path, Arc::clone(context))?)
}

fn pick(corpus: &Collection, index: usize) -> Result<&History, CliError> {
    corpus.get(index).ok_or(CliError::NoSuchHistory {
        index,
        len: corpus.len(),
    })
}

fn render(value: &Value) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn cluster(context: &Arc<MinerContext>, inputs: &[PathBuf], output: &Path) -> Result<String, CliError> {
    let sources: Vec<Box<dyn SampleSource>> = inputs
        .iter()
        .map(|p| Box::new(CollectionFileSource::new(p)) as Box<dyn SampleSource>)
        .collect();
    let harvested = Harvester::new(Arc::clone(context)).run(&sources)?;
    let pipeline = Pipeline::from_config(&context.config.pipeline)?;
    let result = pipeline.run(harvested.data)?;
    result.data.collection.save(output)?;

    let stages: Vec<Value> = result
        .data
        .stages
        .iter()
        .map(|report| {
            let mut row = Map::new();
            row.insert(metrics::STAGE.to_string(), json!(report.stage));
            row.insert(metrics::STAGE_INPUT_SIZE.to_string(), json!(report.input_size));
            row.insert(metrics::STAGE_OUTPUT_SIZE.to_string(), json!(report.output_size));
            row.insert(metrics::STAGE_DURATION_MS.to_string(), json!(report.duration_ms));
            row.insert("outcome".to_string(), json!(report.outcome));
            Value::Object(row)
        })
        .collect();
    let errors: Vec<String> = harvested
        .errors
        .iter()
        .chain(result.errors.iter())
        .map(|e| e.coded_string())
        .collect();
    render(&json!({
        "output": output.display().to_string(),
        "histories": result.data.collection.len(),
        "stages": stages,
        "errors": errors,
    }))
}

pub fn search(context: &Arc<MinerContext>, corpus: &Path, query: &str) -> Result<String, CliError> {
    let base = load(corpus, context)?;
    let query = QueryBuilder::parse(query)?.build()?;
    let hits = search::search(&query, &base, &context.checkpoint())?;

    let mut report = Map::new();
    report.insert(metrics::CORPUS_SIZE.to_string(), json!(base.len()));
    report.insert(metrics::HIT_COUNT.to_string(), json!(hits.len()));
    report.insert("results".to_string(), serde_json::to_value(&hits)?);
    render(&Value::Object(report))
}

pub fn batch(context: &Arc<MinerContext>, corpus: &Path, queries: &Path) -> Result<String, CliError> {
    let base = load(corpus, context)?;
    let queries = load(queries, context)?;
    let buckets = search::batch_search(&queries, &base, &context.checkpoint())?;
    let rows: Vec<Value> = buckets
        .into_iter()
        .map(|(depth, bucket)| {
            json!({
                "depth": depth,
                "queries": bucket.queries,
                "matched": bucket.matched,
                "total_hits": bucket.total_hits,
                "best_score": bucket.best_score,
            })
        })
        .collect();
    render(&Value::Array(rows))
}

pub fn complete(context: &Arc<MinerContext>, corpus: &Path, query: &str) -> Result<String, CliError> {
    let base = load(corpus, context)?;
    let query = QueryBuilder::parse(query)?.titled("query").build()?;
    let completed = search::complete(&query, &base, &context.checkpoint())?;
    tracing::info!(
        unknown_edges = completed.unknown_edge_count(),
        "query completed"
    );
    Ok(to_dot(&completed))
}

pub fn sequences(
    context: &Arc<MinerContext>,
    corpus: &Path,
    index: usize,
    query: Option<&str>,
) -> Result<String, CliError> {
    let base = load(corpus, context)?;
    let history = pick(&base, index)?;
    let query = query
        .map(|q| QueryBuilder::parse(q).and_then(QueryBuilder::build))
        .transpose()?;
    let settings = &context.config.search;
    let top = search::extract_top_sequences(
        query.as_ref(),
        history,
        settings.effective_top_k(),
        settings.effective_max_repeat(),
        &context.checkpoint(),
    )?;
    let rows: Vec<Value> = top
        .iter()
        .map(|s| {
            let steps: Vec<Value> = s
                .steps
                .iter()
                .map(|(labels, weight)| json!({ "labels": labels.to_string(), "weight": weight }))
                .collect();
            json!({ "score": s.score, "steps": steps })
        })
        .collect();
    render(&Value::Array(rows))
}

pub fn stats(context: &Arc<MinerContext>, corpus: &Path) -> Result<String, CliError> {
    let base = load(corpus, context)?;
    let rows: Vec<Value> = base
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let weights = h.weight_stats();
            let mut row = Map::new();
            row.insert("index".to_string(), json!(i));
            row.insert("title".to_string(), json!(h.title()));
            row.insert("nodes".to_string(), json!(h.node_count()));
            row.insert("transitions".to_string(), json!(h.edge_count()));
            row.insert(metrics::UNKNOWN_EDGE_COUNT.to_string(), json!(h.unknown_edge_count()));
            row.insert("depth".to_string(), json!(h.depth()));
            row.insert("max_degree".to_string(), json!(h.max_degree()));
            row.insert("average_weight".to_string(), json!(weights.average));
            row.insert("max_weight".to_string(), json!(weights.max));
            row.insert("types".to_string(), json!(h.types()));
            row.insert("sources".to_string(), json!(h.sources()));
            row.insert("content_hash".to_string(), json!(format!("{:016x}", h.content_hash())));
            Value::Object(row)
        })
        .collect();
    render(&Value::Array(rows))
}

pub fn dot(context: &Arc<MinerContext>, corpus: &Path, index: usize) -> Result<String, CliError> {
    let base = load(corpus, context)?;
    Ok(to_dot(pick(&base, index)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use apimine_analysis::MethodRef;

    fn corpus_file(dir: &Path) -> PathBuf {
        let path = dir.join("corpus.json");
        let mut h = History::titled("Reader.java");
        for name in ["open", "read", "close"] {
            h.extend_with_method_call(MethodRef::new("java.io.File", name, "()V"), 1)
                .unwrap();
        }
        Collection::with_histories(Arc::new(MinerContext::default()), vec![h])
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_search_reports_hits() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = corpus_file(dir.path());
        let context = Arc::new(MinerContext::default());
        let out = search(&context, &corpus, "java.io.File.open()V ? java.io.File.close()V").unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[metrics::HIT_COUNT], json!(1));
        assert_eq!(value["results"][0]["title"], json!("Reader.java"));
    }

    #[test]
    fn test_dot_rejects_bad_index() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = corpus_file(dir.path());
        let context = Arc::new(MinerContext::default());
        let err = dot(&context, &corpus, 4).unwrap_err();
        assert!(matches!(err, CliError::NoSuchHistory { index: 4, len: 1 }));
    }

    #[test]
    fn test_cluster_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = corpus_file(dir.path());
        let output = dir.path().join("out.json");
        let context = Arc::new(MinerContext::default());
        let out = cluster(&context, &[corpus.clone(), corpus], &output).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["histories"], json!(1));
        assert!(output.exists());
    }
}
