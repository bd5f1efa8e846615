//! Plain-text views printed by the console.

use std::fmt::Write;

use chrono::{DateTime, Local};

use crate::client::{CodeStat, Dashboard, EventAnalytics};

pub const RECENT_POINTS: usize = 7;

fn local_date(iso: &str) -> Option<DateTime<Local>> {
    DateTime::parse_from_rfc3339(iso)
        .ok()
        .map(|dt| dt.with_timezone(&Local))
}

fn local_time(iso: &str) -> String {
    local_date(iso)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| iso.to_string())
}

fn local_day(iso: Option<&str>) -> String {
    iso.and_then(local_date)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn dashboard(data: &Dashboard) -> String {
    let mut out = String::new();
    let stats = &data.system_stats;
    let _ = writeln!(out, "\n=== 系统统计 ===");
    let _ = writeln!(out, "总验证次数: {}", stats.total_verifications);
    let _ = writeln!(out, "唯一用户数: {}", stats.total_unique_users);
    let _ = writeln!(out, "纸条生成数: {}", stats.total_generated_notes);
    let _ = writeln!(out, "数据更新时间: {}", local_time(&stats.last_updated));

    if let Some(events) = data.event_stats.as_ref().filter(|e| e.error.is_none()) {
        let _ = writeln!(out, "\n=== 事件统计 ===");
        let _ = writeln!(out, "今日事件数: {}", events.today_events);
        let _ = writeln!(out, "昨日事件数: {}", events.yesterday_events);
        if !events.event_type_distribution.is_empty() {
            let _ = writeln!(out, "\n事件类型分布:");
            for item in &events.event_type_distribution {
                let _ = writeln!(out, "- {}: {}", item.event_type, item.count);
            }
        }
    }

    let _ = writeln!(out, "\n=== 邀请码统计 ===");
    let _ = write!(out, "邀请码总数: {}", data.invite_code_stats.len());
    out
}

pub fn codes(codes: &[CodeStat]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n=== 邀请码列表 ===");
    let _ = writeln!(out, "邀请码\t使用次数\t最大次数\t唯一IP\t创建时间\t最后使用");
    let _ = writeln!(out, "{}", "-".repeat(70));
    for code in codes {
        let last_used = if code.last_used == "Never" {
            "未使用".to_string()
        } else {
            local_day(Some(&code.last_used))
        };
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            code.code,
            code.used_count,
            code.max_uses,
            code.unique_ips,
            local_day(code.created_at.as_deref()),
            last_used
        );
    }
    out.truncate(out.trim_end().len());
    out
}

pub fn analytics(data: &EventAnalytics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n=== 事件分析 ===");
    let _ = writeln!(out, "总事件数: {}", data.total_events);
    let _ = writeln!(out, "唯一用户数: {}", data.unique_user_count);
    let _ = writeln!(out, "\n事件类型分布:");
    for item in &data.event_type_distribution {
        let percentage = item.percentage.as_deref().unwrap_or("0.00");
        let _ = writeln!(out, "- {}: {} ({}%)", item.event_type, item.count, percentage);
    }
    let _ = writeln!(out, "\n时间序列数据 (最近{}天):", RECENT_POINTS);
    let skip = data.time_series_data.len().saturating_sub(RECENT_POINTS);
    for point in &data.time_series_data[skip..] {
        let _ = writeln!(out, "{}: {} 事件", point.date, point.count);
    }
    out.truncate(out.trim_end().len());
    out
}

pub const HELP: &str = "
星语心笺管理员控制台工具

用法: soulnote-admin <命令> [参数]

可用命令:
  stats               获取系统统计信息
  list-codes          列出所有邀请码
  generate-code       生成新邀请码，例如:
                      generate-code SOUL 100
  delete-code         删除邀请码，例如:
                      delete-code SOUL123ABC
  event-stats         获取事件统计
  help                显示此帮助信息
";
