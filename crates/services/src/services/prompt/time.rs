//! Wall-clock context for prompts: period of day, day type, festivals and
//! the activity/concern lists a friend would plausibly reference.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::calendar::{CalendarDay, Holiday};

/// Shown when the lunar calendar cannot resolve a date.
const UNKNOWN: &str = "未知";

const WEEK_DAYS: [&str; 7] = ["日", "一", "二", "三", "四", "五", "六"];

const SOLAR_FESTIVALS: &[(u32, u32, &str)] = &[
    (1, 1, "元旦节"),
    (2, 14, "情人节"),
    (3, 8, "妇女节"),
    (3, 12, "植树节"),
    (3, 15, "消费者权益日"),
    (4, 1, "愚人节"),
    (5, 1, "劳动节"),
    (5, 4, "青年节"),
    (6, 1, "儿童节"),
    (7, 1, "建党节"),
    (8, 1, "建军节"),
    (9, 10, "教师节"),
    (10, 1, "国庆节"),
    (10, 31, "万圣节前夜"),
    (11, 1, "万圣节"),
    (12, 24, "平安夜"),
    (12, 25, "圣诞节"),
];

// (month, first day, last day, name) of fixed-date public holidays, used for
// years the published holiday tables do not cover.
const STATUTORY_HOLIDAYS: &[(u32, u32, u32, &str)] = &[
    (1, 1, 1, "元旦"),
    (5, 1, 5, "劳动节"),
    (10, 1, 7, "国庆节"),
];

// First day of each sign, in calendar order starting with 摩羯 in January.
const ASTRO_STARTS: &[(u32, u32, &str)] = &[
    (1, 20, "水瓶"),
    (2, 19, "双鱼"),
    (3, 21, "白羊"),
    (4, 20, "金牛"),
    (5, 21, "双子"),
    (6, 22, "巨蟹"),
    (7, 23, "狮子"),
    (8, 23, "处女"),
    (9, 23, "天秤"),
    (10, 24, "天蝎"),
    (11, 23, "射手"),
    (12, 22, "摩羯"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct DateInfo {
    pub lunar_date: String,
    pub animal: String,
    /// Never empty: `["无特殊节日"]` on ordinary days.
    pub festivals: Vec<String>,
    pub week_day: String,
    pub day_type: String,
    pub astro: String,
    pub solar_term: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TimeContext {
    /// `YYYY-MM-DD HH:MM`
    pub formatted_time: String,
    pub period: &'static str,
    pub suggestions: Vec<String>,
    pub activities: Vec<String>,
    pub concerns: Vec<String>,
    pub date_info: DateInfo,
}

fn lookup(table: &[(u32, u32, &'static str)], date: NaiveDate) -> Option<&'static str> {
    table
        .iter()
        .find(|(m, d, _)| *m == date.month() && *d == date.day())
        .map(|(_, _, name)| *name)
}

pub fn solar_festival(date: NaiveDate) -> Option<&'static str> {
    lookup(SOLAR_FESTIVALS, date)
}

pub fn statutory_holiday(date: NaiveDate) -> Option<&'static str> {
    STATUTORY_HOLIDAYS
        .iter()
        .find(|(m, first, last, _)| *m == date.month() && (*first..=*last).contains(&date.day()))
        .map(|(_, _, _, name)| *name)
}

pub fn astro(date: NaiveDate) -> &'static str {
    let key = (date.month(), date.day());
    ASTRO_STARTS
        .iter()
        .rev()
        .find(|(m, d, _)| (*m, *d) <= key)
        .map(|(_, _, name)| *name)
        .unwrap_or("摩羯")
}

pub fn seasonal_activity(term: &str) -> &'static str {
    match term {
        "立春" => "感受春天的气息，可以踏青",
        "雨水" => "雨季将至，记得携带雨具",
        "惊蛰" => "春雷始鸣，万物复苏",
        "春分" => "昼夜平分，适合户外活动",
        "清明" => "祭祖扫墓，踏青郊游",
        "谷雨" => "雨量增多，春耕开始",
        "立夏" => "夏季开始，防暑降温",
        "小满" => "夏熟作物籽粒开始饱满",
        "芒种" => "农忙时节，播种移苗",
        "夏至" => "一年中昼最长，注意防暑",
        "小暑" => "热浪来袭，注意防晒",
        "大暑" => "一年中最热，注意避暑",
        "立秋" => "秋季开始，天气转凉",
        "处暑" => "暑气渐消，秋高气爽",
        "白露" => "夜晚露水增多，天气转凉",
        "秋分" => "昼夜平分，秋季中点",
        "寒露" => "气温骤降，注意保暖",
        "霜降" => "开始结霜，冬天临近",
        "立冬" => "冬季开始，注意保暖",
        "小雪" => "开始降雪，天气寒冷",
        "大雪" => "雪量增大，严寒将至",
        "冬至" => "一年中昼最短，注意保暖",
        "小寒" => "寒冷加剧，注意防寒",
        "大寒" => "一年中最冷，注意保暖",
        _ => "适应季节变化",
    }
}

struct Day {
    holiday: Option<String>,
    weekend: bool,
    festivals: Vec<String>,
    lunar_festivals: Vec<String>,
    term: Option<String>,
    lunar_date: String,
    animal: String,
    full_moon: bool,
    month: u32,
}

impl Day {
    fn new(date: NaiveDate) -> Self {
        let calendar = CalendarDay::of(date);
        let (holiday, shifted_workday) = match calendar.as_ref() {
            Some(c) if c.holidays_known => match &c.holiday {
                Some(Holiday::Off(name)) => (Some(name.clone()), false),
                Some(Holiday::ShiftedWorkday(_)) => (None, true),
                None => (None, false),
            },
            _ => (statutory_holiday(date).map(str::to_string), false),
        };
        let weekday = date.weekday().num_days_from_sunday();
        let lunar_festivals: Vec<String> = calendar
            .as_ref()
            .and_then(|c| c.lunar_festival.clone())
            .into_iter()
            .collect();
        let mut festivals: Vec<String> = solar_festival(date).map(str::to_string).into_iter().collect();
        festivals.extend(lunar_festivals.iter().cloned());

        Self {
            weekend: (weekday == 0 || weekday == 6) && holiday.is_none() && !shifted_workday,
            holiday,
            festivals,
            lunar_festivals,
            term: calendar.as_ref().and_then(|c| c.solar_term.clone()),
            lunar_date: calendar.as_ref().map_or_else(|| UNKNOWN.to_string(), |c| c.lunar_date.clone()),
            animal: calendar.as_ref().map_or_else(|| UNKNOWN.to_string(), |c| c.animal.clone()),
            full_moon: calendar.as_ref().is_some_and(CalendarDay::is_full_moon),
            month: date.month(),
        }
    }

    fn is_holiday(&self) -> bool {
        self.holiday.is_some()
    }

    fn holiday_name(&self) -> &str {
        self.holiday.as_deref().unwrap_or("")
    }

    fn festive(&self) -> bool {
        self.is_holiday() || !self.festivals.is_empty()
    }

    fn day_type(&self) -> String {
        match &self.holiday {
            Some(name) => format!("法定假日({name})"),
            None if self.weekend => "周末".to_string(),
            None => "工作日".to_string(),
        }
    }
}

pub fn date_info(date: NaiveDate) -> DateInfo {
    let day = Day::new(date);
    date_info_for(date, &day)
}

fn date_info_for(date: NaiveDate, day: &Day) -> DateInfo {
    let festivals = if day.festivals.is_empty() {
        vec!["无特殊节日".to_string()]
    } else {
        day.festivals.clone()
    };
    DateInfo {
        lunar_date: day.lunar_date.clone(),
        animal: day.animal.clone(),
        festivals,
        week_day: WEEK_DAYS[date.weekday().num_days_from_sunday() as usize].to_string(),
        day_type: day.day_type(),
        astro: astro(date).to_string(),
        solar_term: day.term.clone(),
    }
}

#[derive(Default)]
struct Lists {
    suggestions: Vec<String>,
    activities: Vec<String>,
    concerns: Vec<String>,
}

impl Lists {
    fn base(suggestions: &[&str], activities: &[&str], concerns: &[&str]) -> Self {
        Self {
            suggestions: owned(suggestions),
            activities: owned(activities),
            concerns: owned(concerns),
        }
    }

    fn suggest(&mut self, items: impl IntoIterator<Item = impl Into<String>>) {
        self.suggestions.extend(items.into_iter().map(Into::into));
    }

    fn act(&mut self, items: impl IntoIterator<Item = impl Into<String>>) {
        self.activities.extend(items.into_iter().map(Into::into));
    }

    fn concern(&mut self, items: impl IntoIterator<Item = impl Into<String>>) {
        self.concerns.extend(items.into_iter().map(Into::into));
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn time_context(now: NaiveDateTime, savage: bool) -> TimeContext {
    let date = now.date();
    let day = Day::new(date);
    let hour = now.hour();
    let h = day.holiday_name();

    let (period, lists) = match hour {
        5..=8 => ("清晨", if savage { early_savage(&day) } else { early_warm(&day, h) }),
        9..=11 => ("上午", if savage { morning_savage(&day) } else { morning_warm(&day, h) }),
        12..=13 => ("中午", if savage { noon_savage(&day, h) } else { noon_warm(&day, h) }),
        14..=17 => ("下午", if savage { afternoon_savage(&day, h) } else { afternoon_warm(&day, h) }),
        18..=20 => ("傍晚", if savage { evening_savage(&day, h) } else { evening_warm(&day, h) }),
        21..=23 => ("晚上", if savage { night_savage(&day, h) } else { night_warm(&day, h) }),
        _ => ("深夜", if savage { late_savage(&day) } else { late_warm(&day) }),
    };

    TimeContext {
        formatted_time: now.format("%Y-%m-%d %H:%M").to_string(),
        period,
        suggestions: lists.suggestions,
        activities: lists.activities,
        concerns: lists.concerns,
        date_info: date_info_for(date, &day),
    }
}

fn early_savage(day: &Day) -> Lists {
    let mut l = Lists::base(
        &["勉强从床上爬起来", "装作精神焕发的样子", "假装自己是个早起的人", "又在做清晨5分钟冥想，然后迟到一小时", "喝杯黑咖啡掩盖你的黑眼圈"],
        &["挣扎着睁开眼", "对着镜子掩饰黑眼圈", "喝咖啡假装自己清醒", "刷牙时间玩手机", "写个朋友圈假装早起"],
        &["迟到还找借口", "又在做白日梦", "熬夜后的后悔时刻", "起床气爆表", "明明可以再睡五分钟"],
    );
    if day.festive() {
        l.suggest(["假期还起这么早，真是个假期废物", "难得放假还那么自虐早起"]);
        l.concern(["节日焦虑症又犯了吧，假期也不会放过自己", "怕浪费假期结果起早贪黑，活该累"]);
    } else if day.weekend {
        l.suggest(["周末不睡懒觉，起这么早是大脑有泡", "假装早起很自律，其实不过是睡不着"]);
        l.concern(["周末早起装清醒，就你最能装", "又没睡好现在头疼了吧"]);
    }
    l
}

fn early_warm(day: &Day, h: &str) -> Lists {
    let mut l = Lists::base(
        &["吃顿丰盛的早餐", "享受一天中最清新的时光", "早起是个好习惯", "给自己煮一杯热牛奶", "准备一杯蜂蜜柠檬水"],
        &["晨跑", "冥想", "规划今天", "给自己做一顿营养早餐", "晨间拉伸", "写日记", "照顾花草"],
        &["不要匆忙赶路", "给自己足够准备时间", "照顾好自己的胃", "不要空腹喝咖啡", "早餐要吃好"],
    );
    if day.is_holiday() {
        l.suggest(["享受假日的悠闲早晨".to_string(), format!("{h}假期愉快"), "为自己准备一杯鲜榨果汁".to_string()]);
        l.act(["准备节日活动", "与家人共度时光", "做一顿丰盛节日早餐", "整理家居环境", "为家人煮一壶花茶"]);
        l.concern(["别错过节日特别活动", "保持节日好心情", "与亲友分享节日快乐"]);
    } else if day.weekend {
        l.suggest(["周末早晨可以稍微放松一下", "规划一个愉快的周末", "煮一杯奶茶犒劳自己"]);
        l.act(["周末休闲活动", "补充睡眠", "花时间做个精致早餐", "为家人准备爱心早点", "整理个人空间"]);
        l.concern(["周末也要保持良好作息", "早餐别太油腻", "照顾好自己的身体"]);
    } else {
        l.suggest(["为一天的工作做好准备", "早起赢得效率", "来杯热牛奶温暖身心", "为自己准备一顿营养早餐"]);
        l.concern(["避免早高峰拥堵", "不要急匆匆赶路", "不要吃不健康的早餐"]);
        l.act(["整理工作计划", "为家人准备早点", "听一段轻音乐", "收拾好个人物品"]);
    }
    if !day.lunar_festivals.is_empty() {
        l.suggest([format!("今天是{}，记得传统习俗", day.lunar_festivals.join("/")), "品尝节日传统食物".to_string()]);
        l.act(["参与传统节日活动", "了解节日文化背景", "准备一些节日特色食物"]);
        l.concern(["传承优良传统", "与家人共享节日氛围"]);
    }
    l
}

fn morning_savage(day: &Day) -> Lists {
    let mut l = Lists::base(
        &["装作在工作的样子", "对着电脑发呆", "用开会逃避责任", "又迟到了还找什么借口", "第三杯咖啡下肚，装清醒的样子"],
        &["摸鱼", "刷社交媒体", "走神", "编造工作进度", "偷偷打个盹"],
        &["被老板抓包", "工作进度落后", "午饭前的无限等待", "又在偷懒等下班", "明明能十分钟完成的工作拖一上午"],
    );
    if day.festive() {
        l.suggest(["难得假期还想着工作，真是没救了", "为什么不多睡会，急着起来干嘛"]);
        l.concern(["假期焦虑症又犯了是吧", "假期上午不睡懒觉，人生还有什么意义"]);
    } else if day.weekend {
        l.suggest(["周末上午还在想工作，真是个工作狂魔", "难得周末不睡懒觉，脑子有问题吧"]);
        l.concern(["周末不睡懒觉，浪费假期天赋", "这么早起来干啥，显摆自律吗"]);
    }
    l
}

fn morning_warm(day: &Day, h: &str) -> Lists {
    let mut l = Lists::base(
        &["专注工作", "处理最重要的任务", "喝杯咖啡或茶提神", "为自己泡一杯花茶", "吃些坚果补充能量"],
        &["高效工作", "头脑风暴", "重要会议", "整理工作计划", "做些创意思考", "准备一杯自己喜欢的饮品"],
        &["记得给眼睛休息", "保持水分", "别被琐事分散注意力", "注意坐姿", "每工作一小时小休片刻"],
    );
    if day.is_holiday() {
        l.suggest([format!("享受{h}假期"), "放下工作压力".to_string(), "来一杯精致的早茶".to_string()]);
        l.act(["节日活动", "休闲娱乐", "准备一份美味早午餐", "拍摄美丽景色", "写一篇节日感想"]);
        l.concern(["不要让工作影响假期心情", "保持愉快的心情", "与亲友分享快乐"]);
    } else if day.weekend {
        l.suggest(["周末上午可以悠闲一些", "做些平时没时间做的事", "享受一顿丰盛早餐"]);
        l.act(["休闲娱乐", "购物", "户外活动", "整理个人空间", "为植物浇水"]);
        l.concern(["不必给自己太多压力", "慢节奏享受生活", "照顾好自己的胃"]);
    } else {
        l.suggest(["上午是高效工作的黄金时段", "合理安排任务顺序", "准备一杯提神的饮品"]);
        l.act(["处理重要邮件", "规划今日工作", "与团队简短会议", "给植物喷水", "准备一些健康零食"]);
        l.concern(["避免会议过多占用时间", "设置专注时间段", "注意用眼卫生"]);
    }
    if let Some(term) = day.term.as_deref() {
        l.suggest([format!("今天是{term}，{}", seasonal_activity(term))]);
        l.act(["感受节气变化"]);
    }
    l
}

fn noon_savage(day: &Day, h: &str) -> Lists {
    let mut l = Lists::base(
        &["装作很忙不想午休的样子", "吃完午饭就开始犯困", "又点了外卖是吧", "一天的工作还没做完，急着吃饭？", "午饭吃得这么多，下午困意十足"],
        &["打瞌睡", "偷偷躲起来午休", "对着手机发呆", "装模作样吃沙拉减肥", "边吃饭边刷剧效率高手"],
        &["下午的会议又要迟到", "吃太多导致下午昏昏欲睡", "午饭又吃垃圾食品", "消化不良是日常", "吃完饭就困，猪都比你精神"],
    );
    if day.festive() {
        l.suggest([format!("{h}假期午餐又要吃到撑？节制点吧"), "假期午餐吃大餐，钱包瘦身计划".to_string()]);
        l.concern(["假期吃太多又要长肉了", "又在为午饭消耗假期时光"]);
    } else if day.weekend {
        l.suggest(["周末还不多睡会，中午就开始折腾", "做什么午餐这么讲究，平时将就惯了"]);
        l.concern(["周末午餐又要吃泡面？真有创意", "吃完又躺尸，猪生日常"]);
    }
    l
}

fn noon_warm(day: &Day, h: &str) -> Lists {
    let mut l = Lists::base(
        &["享用营养午餐", "适当午休", "放松一下紧张的神经", "给自己冲一杯花茶", "来份水果补充维生素"],
        &["短暂午睡", "轻松用餐", "舒展身体", "准备一份可口午餐", "享用一顿营养均衡的饭菜", "听些轻音乐"],
        &["避免过量进食", "注意饮食均衡", "午休不宜过长", "选择易消化的食物", "注意保护胃部健康"],
    );
    if day.is_holiday() {
        l.suggest([format!("{h}假期午餐可以稍微丰盛些"), "与亲友共进午餐".to_string(), "尝试做一道新菜犒劳自己".to_string()]);
        l.act(["节日特色美食", "轻松交谈", "分享美食照片", "用特别餐具提升用餐体验"]);
        l.concern(["控制节日食品热量", "保持饮食多样化", "留出活动空间"]);
    } else if day.weekend {
        l.suggest(["周末午餐可以慢慢享用", "准备些可口的饭菜", "尝试一家新餐厅"]);
        l.act(["尝试新食谱", "与家人共进午餐", "制作一道拿手菜", "摆盘精美增加食欲"]);
        l.concern(["避免暴饮暴食", "饭后短暂休息", "周末也要规律饮食"]);
    } else {
        l.suggest(["工作日午餐要营养均衡", "午休能提高下午效率", "准备一份爱心便当"]);
        l.concern(["避免午餐过饱影响下午工作", "避免高糖食物导致下午困倦", "注意用餐姿势"]);
        l.act(["午餐后漫步十分钟", "整理工作台面", "准备下午所需物品"]);
    }
    if !day.festivals.is_empty() {
        l.suggest([format!("{}，可以享用应景食物", day.festivals.join("/")), "品尝节日特色美食".to_string()]);
        l.act(["记录节日餐点", "与亲友分享节日食物照片"]);
    }
    l
}

fn afternoon_savage(day: &Day, h: &str) -> Lists {
    let mut l = Lists::base(
        &["假装很忙的样子", "又开始犯困了是不是", "盯着时钟等下班", "下午三点困意来袭，继续装清醒", "来杯咖啡掩盖你的疲倦"],
        &["喝咖啡提神", "装作专心工作", "在会议上走神", "偷偷刷手机", "画个淡妆掩盖黑眼圈"],
        &["下午效率低到可怜", "又在摸鱼刷手机", "日复一日的碌碌无为", "咖啡喝多了晚上又要失眠", "用零食麻痹自己"],
    );
    if day.festive() {
        l.suggest([format!("{h}假期下午还不出去玩，窝在家里刷手机？"), "下午睡个懒觉，晚上又要睡不着了".to_string()]);
        l.concern(["假期过半已经开始焦虑了吧", "假期宅在家里又要虚度光阴"]);
    } else if day.weekend {
        l.suggest(["周末下午还不出门，又要荒废一天", "窝在沙发上吃零食，难怪越来越胖"]);
        l.concern(["周末又在沙发上瘫着，活该没精彩生活", "为明天上班焦虑已经开始了是吧"]);
    }
    l
}

fn afternoon_warm(day: &Day, h: &str) -> Lists {
    let mut l = Lists::base(
        &["保持适度饮水", "调整下午工作节奏", "适当休息提升效率", "给自己泡一杯花茶", "下午补充一些水果"],
        &["处理常规任务", "短暂小憩", "计划收尾工作", "做些伸展运动", "打理个人空间", "给自己煮一杯咖啡"],
        &["避免久坐不动", "保持工作专注", "适当运动舒缓身心", "注意下午情绪波动", "避免摄入过多糖分"],
    );
    if day.is_holiday() {
        l.suggest([format!("充分享受{h}假期下午时光"), "安排些轻松活动".to_string(), "来杯手工果茶犒劳自己".to_string()]);
        l.act(["户外活动", "假期社交", "休闲购物", "烘焙一些小点心", "拍照记录美好时光"]);
        l.concern(["注意防晒", "避免活动过度", "保持愉快心情"]);
    } else if day.weekend {
        l.suggest(["周末下午适合外出走走", "做些平时没时间做的事", "来杯特调咖啡享受悠闲"]);
        l.act(["探访亲友", "户外休闲", "看场电影", "逛逛花市或书店", "准备一份精致点心"]);
        l.concern(["适量享用甜点", "记得给植物浇水", "整理一下生活空间"]);
    } else {
        l.suggest(["下午是完成日常任务的好时机", "为明天做些准备", "犒劳自己一杯好茶或咖啡"]);
        l.concern(["避免下午疲劳影响效率", "合理安排高低强度任务", "注意坐姿避免颈椎疲劳"]);
        l.act(["做三分钟眼部按摩", "五分钟伸展运动", "整理工作空间"]);
    }
    l
}

fn evening_savage(day: &Day, h: &str) -> Lists {
    let mut l = Lists::base(
        &["又要加班吗，真拼命", "回家路上堵车的痛苦即将开始", "晚饭又要将就了是吧"],
        &["拖着疲惫的身体回家", "点外卖", "对着手机发呆"],
        &["一整天的疲惫都在此刻爆发", "回家还要面对一堆家务", "明天还要重复今天的无聊"],
    );
    if day.festive() {
        l.suggest([format!("{h}傍晚还在想工作？假期综合征患者")]);
        l.concern(["假期余额不足的焦虑又来了"]);
    } else if day.weekend {
        l.suggest(["周末傍晚还没安排约会？孤独终老实锤了"]);
        l.concern(["明天就要上班，周末综合征提前到来"]);
    }
    l
}

fn evening_warm(day: &Day, h: &str) -> Lists {
    let mut l = Lists::base(
        &["享受宁静的傍晚时光", "安排轻松的晚餐", "放松一天的疲劳"],
        &["散步消食", "轻松娱乐", "与家人共度时光"],
        &["避免晚餐过重", "保持良好心情", "为睡眠做准备"],
    );
    if day.is_holiday() {
        l.suggest([format!("{h}节日傍晚享受团聚时光"), "参与节日活动".to_string()]);
        l.act(["节日晚宴", "观赏节日灯光", "欣赏节目表演"]);
        l.concern(["注意节日安全"]);
    } else if day.weekend {
        l.suggest(["周末傍晚可以安排社交活动", "享受休闲时光"]);
        l.act(["赴约会友", "家庭聚餐", "文化娱乐"]);
    } else {
        l.suggest(["工作日傍晚放松心情", "做好工作与生活的转换"]);
        l.act(["健身锻炼", "准备健康晚餐", "整理一天的收获"]);
    }
    l.suggest([match day.month {
        3..=5 => "春季傍晚天气宜人，适合户外活动",
        6..=8 => "夏季傍晚凉爽下来，适合户外散步",
        9..=11 => "秋季傍晚风景怡人，适合赏景拍照",
        _ => "冬季傍晚注意保暖，享受温馨室内时光",
    }]);
    l
}

fn night_savage(day: &Day, h: &str) -> Lists {
    let mut l = Lists::base(
        &["又要熬夜看剧是吧", "明天起床又要赖床了", "装模作样的写个总结", "喝杯热牛奶装养生？还不是熬夜", "洗个澡还要刷手机是吧"],
        &["无效率地刷手机", "拖延睡觉时间", "忙着做明天要后悔的事", "边吃零食边看剧", "对着镜子假装做护肤"],
        &["睡眠不足导致的黑眼圈", "熬夜带来的皮肤问题", "半夜饿了又忍不住吃夜宵", "又在自欺欺人地喝牛奶", "明明困得要命还要熬夜"],
    );
    if day.festive() {
        l.suggest([format!("{h}晚上熬夜，明天假期就浪费在补觉上了"), "假期晚上吃垃圾食品，积攒的肥肉好好享受吧".to_string()]);
        l.concern(["假期综合征最后的狂欢", "晚上嘴刁得很，明天胃痛怪谁"]);
    } else if day.weekend {
        l.suggest(["周末晚上还不早点睡，周一又要顶着熊猫眼上班", "忙着做面膜，皮肤已经被你熬废了"]);
        l.concern(["周末晚上的焦虑已经提前到来", "明天上班起不来可别怪闹钟"]);
    }
    l
}

fn night_warm(day: &Day, h: &str) -> Lists {
    let mut l = Lists::base(
        &["为一天画上完美句号", "做好睡前准备", "回顾今日收获", "煮一杯香草牛奶犒劳自己", "为自己准备一本好书"],
        &["阅读放松", "听舒缓音乐", "整理思绪", "写一写感恩日记", "给明天的自己做好准备", "泡个舒适的热水澡"],
        &["避免使用电子产品影响睡眠", "保持规律作息", "创造良好睡眠环境", "睡前一小时别吃太多食物", "选择温和的晚间护肤"],
    );
    if day.is_holiday() {
        l.suggest([format!("{h}晚上享受节日氛围"), "与亲友共度美好时光".to_string(), "为自己准备一杯热巧克力".to_string()]);
        l.act(["观赏节日表演", "参与节日活动", "分享节日祝福", "烤些节日小点心", "拍摄节日美好瞬间"]);
        l.concern(["节日零食适量享用", "保持愉快心情入睡"]);
    } else if day.weekend {
        l.suggest(["周末晚上可以稍晚休息", "为新的一周做好准备", "来杯花草茶舒缓心情"]);
        l.act(["整理下周计划", "准备明日所需物品", "做15分钟舒缓瑜伽", "与家人分享周末甜点", "准备一份美味早餐"]);
        l.concern(["避免周末综合征影响情绪", "保持良好的睡眠环境"]);
    } else {
        l.suggest(["工作日晚上早点休息", "保证充足睡眠", "来杯温热牛奶助眠", "写下明天的三个小目标"]);
        l.concern(["避免过度劳累影响第二天状态", "如果有困扰的事情，记下来明天再解决"]);
        l.act(["做15分钟伸展运动", "整理好明天的着装", "为自己泡一杯安神茶"]);
    }
    if day.full_moon {
        l.suggest(["今晚月色正好，适合赏月", "煮一壶花茶，配着月光品尝"]);
        l.act(["月下漫步", "观星赏月", "拍摄月亮照片", "写一首月亮小诗"]);
    }
    l
}

fn late_savage(day: &Day) -> Lists {
    let mut l = Lists::base(
        &["熬夜冠军非你莫属", "又在后悔为什么不早点睡", "明早又要赖床迟到了", "深夜饿了又想吃垃圾食品是吧", "又在装深夜有灵感的文艺青年"],
        &["无意义刷手机", "盯着天花板数羊", "给明天的黑眼圈打下基础", "偷偷摸摸找夜宵", "假装很忙的样子"],
        &["猝死预警", "熬夜脱发正在进行时", "生物钟已经彻底混乱", "半夜吃东西又要长胖了", "明天起床又要后悔现在不睡觉"],
    );
    if day.is_holiday() || day.weekend {
        l.suggest(["假期熬夜，精力透支，真有你的", "深夜来碗泡面，明天胃痛活该"]);
        l.concern(["作息混乱的后果自己承担吧", "又在玩手机是吧，眼睛不要了"]);
    }
    l
}

fn late_warm(day: &Day) -> Lists {
    let mut l = Lists::base(
        &["尽快入睡休息", "调整呼吸放松身心", "为明天储备能量", "煮一杯温热牛奶助眠", "饿了的话可以吃点轻食宵夜"],
        &["冥想放松", "轻柔音乐助眠", "安静阅读", "整理一天的心情", "写一写今日感想", "泡个热水澡放松身心"],
        &["避免强光刺激", "保持安静环境", "注意睡眠质量", "不要吃太油腻的宵夜", "热牛奶放蜂蜜更助眠"],
    );
    if day.is_holiday() {
        l.suggest(["即使是假期也要注意休息", "调整作息更健康", "可以为自己准备一杯茶或热可可"]);
        l.act(["记录假期美好瞬间", "为自己准备一份简单可口的宵夜"]);
    } else if day.weekend {
        l.suggest(["周末也要保持规律作息", "良好睡眠质量更重要", "为自己煮杯牛奶犒劳一周辛苦"]);
        l.act(["为自己做个面膜护理", "准备一份健康的宵夜"]);
    } else {
        l.suggest(["工作日深夜应尽快休息", "保证明天的工作状态", "一杯热牛奶能帮助睡眠"]);
        l.concern(["避免长期熬夜对健康的影响", "宵夜选择水果或酸奶更健康"]);
        l.act(["给明天的自己准备一份小惊喜", "整理床铺创造舒适睡眠环境"]);
    }
    l
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap()
    }

    #[test]
    fn periods_follow_hour_ranges() {
        let cases = [
            (5, "清晨"),
            (9, "上午"),
            (12, "中午"),
            (14, "下午"),
            (18, "傍晚"),
            (21, "晚上"),
            (0, "深夜"),
            (4, "深夜"),
        ];
        for (hour, period) in cases {
            assert_eq!(time_context(at(2025, 3, 12, hour), false).period, period, "hour {hour}");
        }
    }

    #[test]
    fn formats_time() {
        let ctx = time_context(at(2025, 3, 4, 7), false);
        assert_eq!(ctx.formatted_time, "2025-03-04 07:30");
    }

    #[test]
    fn day_types() {
        // 2025-03-11 is a Tuesday, 2025-03-15 a Saturday.
        assert_eq!(date_info(NaiveDate::from_ymd_opt(2025, 3, 11).unwrap()).day_type, "工作日");
        assert_eq!(date_info(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()).day_type, "周末");
        let national = date_info(NaiveDate::from_ymd_opt(2025, 10, 4).unwrap());
        assert_eq!(national.day_type, "法定假日(国庆中秋)");
        assert_eq!(national.week_day, "六");
        // Sunday 2025-09-28 is a make-up workday.
        assert_eq!(date_info(NaiveDate::from_ymd_opt(2025, 9, 28).unwrap()).day_type, "工作日");
        // No published table: fall back to the fixed-date holidays.
        assert_eq!(date_info(NaiveDate::from_ymd_opt(2090, 10, 3).unwrap()).day_type, "法定假日(国庆节)");
    }

    #[test]
    fn festivals_default_when_none() {
        let plain = date_info(NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());
        assert_eq!(plain.festivals, vec!["无特殊节日"]);
        assert_eq!(plain.lunar_date, "二〇二五年二月十二");
        assert_eq!(plain.animal, "蛇");
        assert_eq!(plain.solar_term, None);
        let xmas = date_info(NaiveDate::from_ymd_opt(2025, 12, 25).unwrap());
        assert_eq!(xmas.festivals, vec!["圣诞节"]);
    }

    #[test]
    fn astro_boundaries() {
        let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
        assert_eq!(astro(d(1, 1)), "摩羯");
        assert_eq!(astro(d(1, 20)), "水瓶");
        assert_eq!(astro(d(3, 20)), "双鱼");
        assert_eq!(astro(d(3, 21)), "白羊");
        assert_eq!(astro(d(12, 22)), "摩羯");
    }

    #[test]
    fn solar_term_adds_morning_suggestion() {
        let ctx = time_context(at(2025, 6, 21, 10), false);
        assert_eq!(ctx.date_info.solar_term.as_deref(), Some("夏至"));
        assert!(ctx.suggestions.iter().any(|s| s == "今天是夏至，一年中昼最长，注意防暑"));
        assert!(ctx.activities.iter().any(|s| s == "感受节气变化"));
    }

    #[test]
    fn holiday_lines_use_holiday_name() {
        let ctx = time_context(at(2025, 5, 2, 7), false);
        assert!(ctx.suggestions.iter().any(|s| s == "劳动节假期愉快"));

        let savage = time_context(at(2025, 5, 2, 12), true);
        assert!(savage.suggestions.iter().any(|s| s.starts_with("劳动节假期午餐")));
    }

    #[test]
    fn mid_autumn_date_info() {
        let info = date_info(NaiveDate::from_ymd_opt(2025, 10, 6).unwrap());
        assert_eq!(info.lunar_date, "二〇二五年八月十五");
        assert_eq!(info.animal, "蛇");
        assert!(info.festivals.iter().any(|f| f == "中秋节"));
        assert!(info.day_type.starts_with("法定假日("));
    }

    #[test]
    fn full_moon_night_suggests_moon_viewing() {
        let warm = time_context(at(2025, 10, 6, 21), false);
        assert!(warm.suggestions.iter().any(|s| s == "今晚月色正好，适合赏月"));
        assert!(warm.activities.iter().any(|s| s == "月下漫步"));

        let new_moon = time_context(at(2025, 10, 21, 21), false);
        assert!(!new_moon.suggestions.iter().any(|s| s == "今晚月色正好，适合赏月"));
    }

    #[test]
    fn lunar_festival_morning_lines() {
        let ctx = time_context(at(2025, 1, 29, 7), false);
        assert!(ctx.date_info.festivals.iter().any(|f| f == "春节"));
        assert!(ctx.suggestions.iter().any(|s| s == "今天是春节，记得传统习俗"));
        assert!(ctx.concerns.iter().any(|s| s == "传承优良传统"));
    }

    #[test]
    fn lunar_year_lags_at_january() {
        let info = date_info(NaiveDate::from_ymd_opt(2025, 1, 20).unwrap());
        assert!(info.lunar_date.starts_with("二〇二四年腊月"));
        assert_eq!(info.animal, "龙");
    }

    #[test]
    fn evening_adds_seasonal_line() {
        let ctx = time_context(at(2025, 1, 14, 19), false);
        assert_eq!(
            ctx.suggestions.last().map(String::as_str),
            Some("冬季傍晚注意保暖，享受温馨室内时光")
        );
    }
}
