// ==========================================
// 高校排考系统 - CLI 入口
// ==========================================
// 用法:
//   exam-aps <db_path> <command> <session_id>
//
// 命令:
//   prepare <session_id>     批次准备 (批量创建 pending 考试)
//   schedule <session_id>    批次整体排期
//   supervisors <session_id> 批次监考分配
//   conflicts <session_id>   批次冲突审计
//   clear <session_id>       清除批次排期
//   stats <session_id>       批次统计
//
// 轻量运行器,不启动任何 UI / 网络服务
// ==========================================

use exam_aps::api::SchedulingApi;
use exam_aps::db;
use std::sync::{Arc, Mutex};

/// 默认数据库路径 (用户数据目录下)
fn default_db_path() -> String {
    dirs::data_local_dir()
        .map(|d| {
            d.join("exam-aps")
                .join("exam_aps.db")
                .to_string_lossy()
                .into_owned()
        })
        .unwrap_or_else(|| "exam_aps.db".to_string())
}

fn print_usage() {
    eprintln!("用法: exam-aps <db_path> <command> <session_id>");
    eprintln!("命令: prepare | schedule | supervisors | conflicts | clear | stats");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志系统
    exam_aps::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 考试排期决策支持引擎", exam_aps::APP_NAME);
    tracing::info!("系统版本: {}", exam_aps::VERSION);
    tracing::info!("==================================================");

    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or_else(default_db_path);
    let command = match args.next() {
        Some(c) => c,
        None => {
            print_usage();
            return Err("缺少命令".into());
        }
    };
    let target_id = args.next();

    tracing::info!("使用数据库: {}", db_path);

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Arc::new(Mutex::new(db::open_sqlite_connection(&db_path)?));
    {
        let c = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        db::init_schema(&c)?;

        if let Some(version) = db::read_schema_version(&c)? {
            if version != db::CURRENT_SCHEMA_VERSION {
                tracing::warn!(
                    found = version,
                    expected = db::CURRENT_SCHEMA_VERSION,
                    "schema_version 与当前代码不一致"
                );
            }
        }
    }

    let api = SchedulingApi::from_connection(conn)?;

    let session_id = target_id.ok_or_else(|| {
        print_usage();
        "缺少 session_id 参数"
    })?;

    match command.as_str() {
        "prepare" => {
            let result = api.prepare_session(&session_id).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "schedule" => {
            let result = api.schedule_session(&session_id).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "supervisors" => {
            let result = api.assign_supervisors(&session_id).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "conflicts" => {
            let conflicts = api.detect_conflicts(&session_id).await?;
            println!("{}", serde_json::to_string_pretty(&conflicts)?);
        }
        "clear" => {
            let result = api.clear_session(&session_id).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "stats" => {
            let result = api.session_stats(&session_id).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        other => {
            print_usage();
            return Err(format!("未知命令: {}", other).into());
        }
    }

    Ok(())
}
