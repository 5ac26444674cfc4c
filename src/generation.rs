
use crate::ai::TextModel;
use crate::charts::parser::{self, GeneratedSections};
use crate::charts::prompt;
use crate::charts::{ChartRecord, NewChart};
use crate::data;
use crate::errors::AppError;
use crate::executor::TaskExecutor;
use crate::limiter::RateLimiter;
use crate::logging::*;
use async_trait::async_trait;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::result::Result;
use std::sync::Arc;

/// チャートタスクの永続化層。
/// 遷移系の戻り値 bool は「行が実際に更新されたか」。terminal に達した行への
/// 遷移書き込みは false になる（状態機械の単調性はストア側でも守る）。
#[async_trait]
pub trait ChartStore {
    async fn create(&self, chart: NewChart) -> Result<i64, AppError>;
    async fn mark_running(&self, id: i64) -> Result<bool, AppError>;
    async fn mark_succeeded(
        &self,
        id: i64,
        gen_chart: &str,
        gen_result: &str,
    ) -> Result<bool, AppError>;
    async fn mark_failed(&self, id: i64, message: &str) -> Result<bool, AppError>;
    async fn get(&self, id: i64) -> Result<Option<ChartRecord>, AppError>;
}

#[derive(Debug, Clone)]
pub struct GenRequest {
    pub goal: String,
    pub name: Option<String>,
    pub chart_type: Option<String>,
    pub chart_data: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct GenOutcome {
    pub chart_id: i64,
    pub gen_chart: String,
    pub gen_result: String,
}

/// 生成パイプラインの唯一のポリシー層。
/// 流入制御 → タスク作成 → （同期は inline / 非同期はワーカープール）→
/// wait → running → {succeeded | failed} の遷移列を駆動する。
pub struct GenService<S, M> {
    store: S,
    model: M,
    limiter: RateLimiter,
    executor: TaskExecutor,
}

impl<S, M> GenService<S, M>
where
    S: ChartStore + Send + Sync + 'static,
    M: TextModel + Send + Sync + 'static,
{
    pub fn new(store: S, model: M, limiter: RateLimiter, executor: TaskExecutor) -> Self {
        GenService {
            store,
            model,
            limiter,
            executor,
        }
    }

    fn limit_key(user_id: i64) -> String {
        format!("gen_chart_{user_id}")
    }

    /// 検証と流入制御。どちらで弾かれてもタスクは一切作られない。
    async fn admit_and_create(&self, user_id: i64, req: &GenRequest) -> Result<i64, AppError> {
        data::validate_request(&req.goal, req.name.as_deref())?;
        if !self.limiter.admit(&Self::limit_key(user_id)) {
            return Err(AppError::RateLimitExceeded);
        }
        self.store
            .create(NewChart {
                user_id,
                goal: req.goal.clone(),
                name: req.name.clone(),
                chart_type: req.chart_type.clone(),
                chart_data: req.chart_data.clone(),
            })
            .await
    }

    /// 同期パス。呼び出し元はモデル往復の間ブロックされ、terminal な結果を受け取る。
    /// 失敗してもタスクは terminal 状態で永続化済み。
    pub async fn submit_sync(&self, user_id: i64, req: GenRequest) -> Result<GenOutcome, AppError> {
        let chart_id = self.admit_and_create(user_id, &req).await?;
        let prompt = prompt::build_prompt(&req.goal, req.chart_type.as_deref(), &req.chart_data);
        let sections = self.run_generation(chart_id, prompt).await?;
        Ok(GenOutcome {
            chart_id,
            gen_chart: sections.chart,
            gen_result: sections.conclusion,
        })
    }

    /// 非同期パス。wait で永続化してジョブを積み、タスク id を即座に返す。
    /// 以後のエラーはタスクの terminal 状態に吸収され、ポーリングでのみ見える。
    pub async fn submit_async(
        self: &Arc<Self>,
        user_id: i64,
        req: GenRequest,
    ) -> Result<i64, AppError> {
        let chart_id = self.admit_and_create(user_id, &req).await?;
        let prompt = prompt::build_prompt(&req.goal, req.chart_type.as_deref(), &req.chart_data);

        let service = Arc::clone(self);
        let submitted = self.executor.submit(async move {
            // ジョブ内の panic もこのタスクの failed 遷移に変換する
            let run = AssertUnwindSafe(service.run_generation(chart_id, prompt))
                .catch_unwind()
                .await;
            if run.is_err() {
                service.fail_task(chart_id, "generation job panicked").await;
            }
        });
        if submitted.is_err() {
            // バックログ満杯。wait のまま放置せず、呼び出し元にも返す
            self.fail_task(chart_id, "task backlog is full").await;
            return Err(AppError::QueueFull);
        }
        Ok(chart_id)
    }

    /// 状態遷移列の本体。このタスクを駆動するのは常にこの1ジョブだけなので、
    /// 遷移は厳密に順序付く。
    async fn run_generation(
        &self,
        chart_id: i64,
        prompt: String,
    ) -> Result<GeneratedSections, AppError> {
        let log = DEFAULT.new(o!(
            "function" => "run_generation",
            "chart_id" => chart_id,
        ));

        match self.store.mark_running(chart_id).await {
            Ok(true) => {}
            Ok(false) => {
                let message = "failed to mark chart as running";
                self.fail_task(chart_id, message).await;
                return Err(AppError::Persistence(message.to_string()));
            }
            Err(err) => {
                warn!(log, "running transition failed"; "error" => %err);
                self.fail_task(chart_id, "failed to mark chart as running")
                    .await;
                return Err(err);
            }
        }

        let raw = match self.model.generate(prompt).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(log, "model call failed"; "error" => %err);
                self.fail_task(chart_id, &err.to_string()).await;
                return Err(err);
            }
        };

        let sections = match parser::parse_reply(&raw) {
            Ok(sections) => sections,
            Err(err) => {
                warn!(log, "model reply did not parse"; "error" => %err);
                self.fail_task(chart_id, &err.to_string()).await;
                return Err(err);
            }
        };

        match self
            .store
            .mark_succeeded(chart_id, &sections.chart, &sections.conclusion)
            .await
        {
            Ok(true) => {
                info!(log, "generation succeeded");
                Ok(sections)
            }
            Ok(false) => {
                let message = "failed to mark chart as succeeded";
                self.fail_task(chart_id, message).await;
                Err(AppError::Persistence(message.to_string()))
            }
            Err(err) => {
                warn!(log, "succeeded transition failed"; "error" => %err);
                self.fail_task(chart_id, "failed to mark chart as succeeded")
                    .await;
                Err(err)
            }
        }
    }

    /// 是正書き込みは一度だけ。それも失敗したらログに残して打ち切る。
    /// タスクは最後に永続化できた状態のまま残る（明示した制限）。
    async fn fail_task(&self, chart_id: i64, message: &str) {
        let log = DEFAULT.new(o!(
            "function" => "fail_task",
            "chart_id" => chart_id,
        ));
        match self.store.mark_failed(chart_id, message).await {
            Ok(true) => {}
            Ok(false) => {
                error!(log, "corrective failed write updated no row"; "message" => message);
            }
            Err(err) => {
                error!(log, "corrective failed write errored";
                    "message" => message, "error" => %err);
            }
        }
    }

    /// ポーリング用の取得。
    pub async fn get_chart(&self, id: i64) -> Result<Option<ChartRecord>, AppError> {
        self.store.get(id).await
    }
}
