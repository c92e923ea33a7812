/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 默认级别 `info`，`verbose` 时为 `debug`；设置了 `RUST_LOG` 则以它为准。
/// 重复调用不会报错。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录导出开始信息
///
/// # 参数
/// - `pipeline`: 流水线名称
/// - `group_count`: 分组数量
/// - `image_count`: 图片总数
pub fn log_export_start(pipeline: &str, group_count: usize, image_count: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 开始导出 - {}", pipeline);
    info!("📦 分组: {} 个 / 图片: {} 张", group_count, image_count);
    info!(
        "开始时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `cancelled`: 是否有取消
pub fn print_final_stats(success: usize, failed: usize, cancelled: bool) {
    info!("\n{}", "=".repeat(60));
    info!("📊 导出完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}", success);
    info!("❌ 失败: {}", failed);
    if cancelled {
        info!("🚫 有保存被用户取消");
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
