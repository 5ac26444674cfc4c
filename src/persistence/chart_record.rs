
use crate::charts::{ChartRecord, ChartStatus, NewChart};
use crate::errors::AppError;
use crate::generation::ChartStore;
use crate::persistence::connection_pool;
use crate::persistence::schema::charts;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = charts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // Diesel Queryable でDBスキーマと一致させるため必要
pub struct DbChart {
    pub id: i64,
    pub user_id: i64,
    pub goal: String,
    pub name: Option<String>,
    pub chart_type: Option<String>,
    pub chart_data: String,
    pub status: String,
    pub gen_chart: Option<String>,
    pub gen_result: Option<String>,
    pub exec_message: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub is_deleted: bool,
}

impl TryFrom<DbChart> for ChartRecord {
    type Error = AppError;

    fn try_from(row: DbChart) -> Result<ChartRecord, AppError> {
        Ok(ChartRecord {
            id: row.id,
            user_id: row.user_id,
            goal: row.goal,
            name: row.name,
            chart_type: row.chart_type,
            chart_data: row.chart_data,
            status: row.status.parse()?,
            gen_chart: row.gen_chart,
            gen_result: row.gen_result,
            exec_message: row.exec_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = charts)]
struct NewDbChart {
    user_id: i64,
    goal: String,
    name: Option<String>,
    chart_type: Option<String>,
    chart_data: String,
    status: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    is_deleted: bool,
}

/// メタデータ編集用。None のフィールドは更新しない。
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = charts)]
pub struct ChartMetaChangeset {
    pub name: Option<String>,
    pub goal: Option<String>,
    pub chart_type: Option<String>,
    pub updated_at: NaiveDateTime,
}

/// charts テーブルへの diesel 実装。
/// 遷移書き込みは期待する現在状態で filter し、terminal に達した行を
/// 上書きしない（affected rows = 0 で返る）。
pub struct PgChartStore;

/// 状態遷移の共通書き込み。from に合致する行だけを to へ進める。
async fn transition(
    id: i64,
    from: &[ChartStatus],
    to: ChartStatus,
    gen_chart: Option<String>,
    gen_result: Option<String>,
    exec_message: Option<String>,
) -> Result<bool, AppError> {
    let now = chrono::Utc::now().naive_utc();
    let from: Vec<&'static str> = from.iter().map(|s| s.as_str()).collect();
    let conn = connection_pool::get().await?;
    let updated = conn
        .interact(move |conn| {
            diesel::update(
                charts::table
                    .filter(charts::id.eq(id))
                    .filter(charts::status.eq_any(from)),
            )
            .set((
                charts::status.eq(to.as_str()),
                charts::gen_chart.eq(gen_chart),
                charts::gen_result.eq(gen_result),
                charts::exec_message.eq(exec_message),
                charts::updated_at.eq(now),
            ))
            .execute(conn)
        })
        .await??;
    Ok(updated > 0)
}

#[async_trait]
impl ChartStore for PgChartStore {
    async fn create(&self, chart: NewChart) -> Result<i64, AppError> {
        let now = chrono::Utc::now().naive_utc();
        let row = NewDbChart {
            user_id: chart.user_id,
            goal: chart.goal,
            name: chart.name,
            chart_type: chart.chart_type,
            chart_data: chart.chart_data,
            status: ChartStatus::Wait.as_str().to_string(),
            created_at: now,
            updated_at: now,
            is_deleted: false,
        };
        let conn = connection_pool::get().await?;
        let id = conn
            .interact(move |conn| {
                diesel::insert_into(charts::table)
                    .values(&row)
                    .returning(charts::id)
                    .get_result::<i64>(conn)
            })
            .await??;
        Ok(id)
    }

    async fn mark_running(&self, id: i64) -> Result<bool, AppError> {
        transition(id, &[ChartStatus::Wait], ChartStatus::Running, None, None, None).await
    }

    async fn mark_succeeded(
        &self,
        id: i64,
        gen_chart: &str,
        gen_result: &str,
    ) -> Result<bool, AppError> {
        transition(
            id,
            &[ChartStatus::Running],
            ChartStatus::Succeeded,
            Some(gen_chart.to_string()),
            Some(gen_result.to_string()),
            None,
        )
        .await
    }

    async fn mark_failed(&self, id: i64, message: &str) -> Result<bool, AppError> {
        // running 遷移自体が失敗した場合に備えて wait からの是正も受ける
        transition(
            id,
            &[ChartStatus::Wait, ChartStatus::Running],
            ChartStatus::Failed,
            None,
            None,
            Some(message.to_string()),
        )
        .await
    }

    async fn get(&self, id: i64) -> Result<Option<ChartRecord>, AppError> {
        let conn = connection_pool::get().await?;
        let row = conn
            .interact(move |conn| {
                charts::table
                    .filter(charts::id.eq(id))
                    .filter(charts::is_deleted.eq(false))
                    .select(DbChart::as_select())
                    .first(conn)
                    .optional()
            })
            .await??;
        row.map(ChartRecord::try_from).transpose()
    }
}

/// ページ番号からオフセットへ。呼び出し元の値が大きくてもオーバーフローさせない
fn page_offset(current: i64, page_size: i64) -> i64 {
    (current.max(1) - 1).saturating_mul(page_size.max(0))
}

impl PgChartStore {
    /// 作成ユーザのチャートを新しい順にページングで返す。
    pub async fn list_by_user(
        user_id: i64,
        current: i64,
        page_size: i64,
    ) -> Result<Vec<ChartRecord>, AppError> {
        let offset = page_offset(current, page_size);
        let conn = connection_pool::get().await?;
        let rows = conn
            .interact(move |conn| {
                charts::table
                    .filter(charts::user_id.eq(user_id))
                    .filter(charts::is_deleted.eq(false))
                    .order_by(charts::created_at.desc())
                    .limit(page_size)
                    .offset(offset)
                    .select(DbChart::as_select())
                    .load::<DbChart>(conn)
            })
            .await??;
        rows.into_iter().map(ChartRecord::try_from).collect()
    }

    /// 全ユーザのチャートを新しい順にページングで返す。管理者向け。
    pub async fn list_all(current: i64, page_size: i64) -> Result<Vec<ChartRecord>, AppError> {
        let offset = page_offset(current, page_size);
        let conn = connection_pool::get().await?;
        let rows = conn
            .interact(move |conn| {
                charts::table
                    .filter(charts::is_deleted.eq(false))
                    .order_by(charts::created_at.desc())
                    .limit(page_size)
                    .offset(offset)
                    .select(DbChart::as_select())
                    .load::<DbChart>(conn)
            })
            .await??;
        rows.into_iter().map(ChartRecord::try_from).collect()
    }

    /// 呼び出しユーザが編集できるメタデータのみ更新する。
    pub async fn update_meta(id: i64, changeset: ChartMetaChangeset) -> Result<bool, AppError> {
        let conn = connection_pool::get().await?;
        let updated = conn
            .interact(move |conn| {
                diesel::update(
                    charts::table
                        .filter(charts::id.eq(id))
                        .filter(charts::is_deleted.eq(false)),
                )
                .set(&changeset)
                .execute(conn)
            })
            .await??;
        Ok(updated > 0)
    }

    /// 論理削除。レコードは残すが一覧・取得からは消える。
    pub async fn logical_delete(id: i64) -> Result<bool, AppError> {
        let now = chrono::Utc::now().naive_utc();
        let conn = connection_pool::get().await?;
        let updated = conn
            .interact(move |conn| {
                diesel::update(
                    charts::table
                        .filter(charts::id.eq(id))
                        .filter(charts::is_deleted.eq(false)),
                )
                .set((charts::is_deleted.eq(true), charts::updated_at.eq(now)))
                .execute(conn)
            })
            .await??;
        Ok(updated > 0)
    }
}
