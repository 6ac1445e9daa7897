//! Query-time orchestration.
//!
//! The `(use_hybrid, use_rerank)` flags select one of four fixed stage lists.
//! Stages run strictly in order against one [`RequestContext`].

use anyhow::{bail, Result};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use faqrag_core::traits::{AnswerGenerator, TextSearcher, VectorSearcher};
use faqrag_core::types::{Answer, Citation, ScoredChunk};

use crate::fusion::merge_candidates;
use crate::rerank::Reranker;
use crate::retriever::HybridRetriever;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub topk_vec: usize,
    pub topk_sparse: usize,
    pub topk_after: usize,
    pub use_hybrid: bool,
    pub use_rerank: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self { topk_vec: 5, topk_sparse: 5, topk_after: 5, use_hybrid: true, use_rerank: true }
    }
}

impl QueryOptions {
    pub fn validate(&self) -> Result<()> {
        if self.topk_vec == 0 {
            bail!("topk_vec must be positive");
        }
        if self.topk_sparse == 0 {
            bail!("topk_sparse must be positive");
        }
        if self.topk_after == 0 {
            bail!("topk_after must be positive");
        }
        Ok(())
    }

    pub fn shape(&self) -> PipelineShape {
        PipelineShape::from_flags(self.use_hybrid, self.use_rerank)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RetrieveDense,
    RetrieveSparse,
    Merge,
    Rerank,
    AssembleContext,
    Generate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineShape {
    Dense,
    Hybrid,
    DenseRerank,
    HybridRerank,
}

impl PipelineShape {
    pub fn from_flags(use_hybrid: bool, use_rerank: bool) -> Self {
        match (use_hybrid, use_rerank) {
            (false, false) => PipelineShape::Dense,
            (true, false) => PipelineShape::Hybrid,
            (false, true) => PipelineShape::DenseRerank,
            (true, true) => PipelineShape::HybridRerank,
        }
    }

    pub fn stages(&self) -> &'static [Stage] {
        use Stage::*;
        match self {
            PipelineShape::Dense => &[RetrieveDense, Merge, AssembleContext, Generate],
            PipelineShape::Hybrid => &[RetrieveDense, RetrieveSparse, Merge, AssembleContext, Generate],
            PipelineShape::DenseRerank => &[RetrieveDense, Merge, Rerank, AssembleContext, Generate],
            PipelineShape::HybridRerank => &[RetrieveDense, RetrieveSparse, Merge, Rerank, AssembleContext, Generate],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PipelineShape::Dense => "dense",
            PipelineShape::Hybrid => "hybrid",
            PipelineShape::DenseRerank => "dense+rerank",
            PipelineShape::HybridRerank => "hybrid+rerank",
        }
    }
}

impl fmt::Display for PipelineShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Request-scoped state shared by the stages.
#[derive(Debug, Default)]
struct RequestContext {
    question: String,
    dense: Vec<ScoredChunk>,
    sparse: Vec<ScoredChunk>,
    candidates: Vec<ScoredChunk>,
    reranked: Option<Vec<ScoredChunk>>,
    context: String,
    answer: Option<Answer>,
}

impl RequestContext {
    fn chosen(&self) -> &[ScoredChunk] {
        self.reranked.as_deref().unwrap_or(&self.candidates)
    }
}

/// Everything a query produced; the debug fields back the CLI's retrieval details.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub context: String,
    pub retrieved_dense: Vec<ScoredChunk>,
    pub retrieved_sparse: Vec<ScoredChunk>,
    pub candidates: Vec<ScoredChunk>,
    /// What generation saw: reranked scores when a rerank stage ran, else `candidates`.
    pub final_candidates: Vec<ScoredChunk>,
    pub shape: PipelineShape,
    pub elapsed: Duration,
}

pub struct Pipeline<TI, VI>
where
    TI: TextSearcher,
    VI: VectorSearcher,
{
    retriever: HybridRetriever<TI, VI>,
    reranker: Reranker,
    generator: Box<dyn AnswerGenerator>,
}

impl<TI, VI> Pipeline<TI, VI>
where
    TI: TextSearcher,
    VI: VectorSearcher,
{
    pub fn new(retriever: HybridRetriever<TI, VI>, reranker: Reranker, generator: Box<dyn AnswerGenerator>) -> Self {
        Self { retriever, reranker, generator }
    }

    pub fn retriever(&self) -> &HybridRetriever<TI, VI> {
        &self.retriever
    }

    pub fn run(&self, question: &str, options: &QueryOptions) -> Result<PipelineOutput> {
        options.validate()?;
        if question.trim().is_empty() {
            bail!("question is empty");
        }
        let started = Instant::now();
        let shape = options.shape();
        let mut ctx = RequestContext { question: question.to_string(), ..RequestContext::default() };

        for &stage in shape.stages() {
            debug!(?stage, %shape, "running stage");
            self.run_stage(stage, &mut ctx, options)?;
        }

        let elapsed = started.elapsed();
        let answer = ctx.answer.take().unwrap_or_else(|| self.generator.generate(&ctx.question, &[]));
        info!(
            %shape,
            dense = ctx.dense.len(),
            sparse = ctx.sparse.len(),
            candidates = ctx.candidates.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "query answered"
        );
        let final_candidates = ctx.chosen().to_vec();
        Ok(PipelineOutput {
            answer: answer.answer,
            citations: answer.citations,
            context: ctx.context,
            retrieved_dense: ctx.dense,
            retrieved_sparse: ctx.sparse,
            candidates: ctx.candidates,
            final_candidates,
            shape,
            elapsed,
        })
    }

    fn run_stage(&self, stage: Stage, ctx: &mut RequestContext, options: &QueryOptions) -> Result<()> {
        match stage {
            Stage::RetrieveDense => {
                ctx.dense = self.retriever.retrieve_dense(&ctx.question, options.topk_vec)?;
            }
            Stage::RetrieveSparse => {
                ctx.sparse = self.retriever.retrieve_sparse(&ctx.question, options.topk_sparse)?;
            }
            Stage::Merge => {
                ctx.candidates = merge_candidates(&ctx.dense, &ctx.sparse);
            }
            Stage::Rerank => {
                ctx.reranked = Some(self.reranker.rerank(
                    &ctx.question,
                    ctx.candidates.clone(),
                    options.topk_after,
                    options.use_rerank,
                ));
            }
            Stage::AssembleContext => {
                ctx.context = ctx
                    .chosen()
                    .iter()
                    .map(|c| format!("{} :: {}", c.file_name(), c.text()))
                    .collect::<Vec<_>>()
                    .join("\n\n");
                debug!(context = %ctx.context, "assembled context");
            }
            Stage::Generate => {
                ctx.answer = Some(self.generator.generate(&ctx.question, ctx.chosen()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_follow_flags() {
        assert_eq!(PipelineShape::from_flags(false, false), PipelineShape::Dense);
        assert_eq!(PipelineShape::from_flags(true, true), PipelineShape::HybridRerank);
        assert_eq!(
            PipelineShape::HybridRerank.stages(),
            &[
                Stage::RetrieveDense,
                Stage::RetrieveSparse,
                Stage::Merge,
                Stage::Rerank,
                Stage::AssembleContext,
                Stage::Generate
            ]
        );
        assert!(!PipelineShape::Dense.stages().contains(&Stage::RetrieveSparse));
        assert!(!PipelineShape::Hybrid.stages().contains(&Stage::Rerank));
        assert!(PipelineShape::DenseRerank.stages().contains(&Stage::Rerank));
        for shape in [PipelineShape::Dense, PipelineShape::Hybrid, PipelineShape::DenseRerank, PipelineShape::HybridRerank] {
            assert_eq!(shape.stages().first(), Some(&Stage::RetrieveDense));
            assert_eq!(shape.stages().last(), Some(&Stage::Generate));
        }
    }

    #[test]
    fn zero_topk_is_rejected() {
        assert!(QueryOptions::default().validate().is_ok());
        assert!(QueryOptions { topk_after: 0, ..QueryOptions::default() }.validate().is_err());
        assert!(QueryOptions { topk_vec: 0, ..QueryOptions::default() }.validate().is_err());
    }
}
