//! Phrase pools the generators draw from, plus the brand localization map.
//!
//! Templates use `{brand}`, `{shape}`, `{lens}`, `{collection}`, `{occasion}`, `{core}`,
//! `{kind}` and `{audience_kw}` placeholders. A template whose placeholder resolves to an
//! empty value is skipped, which is how slots that need a missing attribute disappear.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::core::text::collapse_whitespace;

pub const BRAND_MAP_FILE: &str = "brands_ru.json";
pub const SLOGANS_FILE: &str = "slogans.txt";

pub const SLOGANS: &[&str] = &[
    "Красивые", "Крутые", "Стильные", "Модные", "Молодёжные", "Трендовые", "Дизайнерские",
    "Эффектные", "Лаконичные", "Яркие", "Удобные", "Лёгкие", "Актуальные", "Премиальные",
    "Классные", "Сочные", "Смелые", "Элегантные", "Аккуратные", "Статусные", "Городские",
    "Летние", "Повседневные", "Универсальные", "Топовые", "Хитовые", "С характером",
    "Выразительные", "Минималистичные", "Комфортные",
];

/// Canonical product nouns for titles, the first one is preferred.
pub const PRODUCT_NOUNS: [&str; 2] = ["солнцезащитные очки", "солнечные очки"];

pub const CORE_KEYWORDS: &[&str] = &["солнцезащитные очки", "солнечные очки", "очки солнцезащитные"];

pub const KIND_KEYWORDS: &[&str] = &["имиджевые очки", "модные очки", "брендовые очки", "трендовые очки"];

pub const FEMALE_KEYWORD: &str = "очки солнцезащитные женские";
pub const MALE_KEYWORD: &str = "очки солнцезащитные мужские";
pub const UNISEX_KEYWORD: &str = "очки унисекс";

pub const OPENERS: &[&str] = &[
    "{kind} {brand} являются отличным дополнением к любому образу",
    "Современные {core} {brand} сделают яркий акцент как в повседневном стиле, так и в нарядном",
    "{core} {brand} помогают собрать образ и выглядеть стильно в солнечную погоду",
    "Эти {core} {brand} легко сочетаются с одеждой и добавляют аккуратный стильный акцент",
    "{kind} {brand} — удачный вариант на каждый день и на весь сезон",
    "{core} {brand} подойдут тем, кто любит стиль и комфорт без лишнего перегруза",
    "Идеальные {core} {brand} для тех, кто хочет выглядеть уверенно",
    "С моделью {brand} летний гардероб сразу выглядит завершённым",
];

pub const STYLE: &[&str] = &[
    "Смотрятся современно и сразу обращают на себя внимание",
    "Добавляют стильный акцент и делают образ более собранным",
    "Выглядят аккуратно и дорого, при этом легко сочетаются с одеждой",
    "Подходят и под базовый гардероб, и под более яркие сочетания",
    "Универсальный дизайн помогает выглядеть стильно в любой ситуации",
    "Гарантированно освежают даже самый простой образ",
];

pub const FRAME: &[&str] = &[
    "Красивая оправа {shape} подчёркивает черты лица и смотрится ровно",
    "{shape} — удачная форма, которая подчёркивает стиль и не выглядит громоздко",
    "Форма {shape} делает образ более выразительным",
    "Оправа {shape} выглядит эффектно и аккуратно в любом ракурсе",
    "Оправа сидит ровно и не давит — носить комфортно в течение дня",
    "Дизайн оправы универсальный и легко вписывается в разные образы",
];

pub const LENS: &[&str] = &[
    "Линзы {lens} дают комфорт при ярком солнце и подходят для активного дня",
    "{lens} — хороший вариант для города и поездок, когда на улице ярко",
    "С линзами {lens} солнце и блики переносятся заметно комфортнее",
    "Линзы {lens} гарантируют 100% защиту глаз от яркого солнца",
    "Линзы комфортны в солнечную погоду, глаза меньше устают",
    "В яркий день глазам спокойнее, поэтому модель удобна для повседневки",
];

pub const COLLECTION: &[&str] = &[
    "В сезоне {collection} модель выглядит актуально и легко вписывается в летний стиль",
    "Для коллекции {collection} такие очки особенно уместны: и в городе, и на отдыхе",
    "Модель из линейки {collection} поддерживает главные тренды сезона",
];

pub const SCENARIO: &[&str] = &[
    "Подойдут для вождения, работы, учёбы, прогулок, отдыха и путешествий",
    "Можно носить в городе, в дороге, в отпуске, на пляже и на прогулках",
    "Удобны для повседневных дел, поездок за город и долгих прогулок",
    "Хорошо показывают себя в городе, на море и в активном отпуске",
    "Всегда пригодятся в машине, на террасе кафе и в путешествии",
];

pub const AUDIENCE_UNISEX: &[&str] = &[
    "Подойдут как девушкам, так и мужчинам — универсальный дизайн",
    "Модель унисекс отлично дополняет и женский, и мужской образ",
    "{audience_kw} — хороший выбор, если нужен универсальный аксессуар",
];

pub const AUDIENCE_FEMALE: &[&str] = &[
    "Модель подчёркивает женственность и красиво смотрится с платьями и костюмами",
    "{audience_kw} с таким дизайном легко становятся любимым аксессуаром",
    "Девушкам понравится, как оправа смягчает черты лица",
];

pub const AUDIENCE_MALE: &[&str] = &[
    "Строгая линия оправы хорошо подходит к мужскому гардеробу",
    "{audience_kw} с таким дизайном уместны и в деловом, и в спортивном образе",
    "Мужчинам понравится сдержанный характер модели",
];

pub const OCCASION: &[&str] = &[
    "Хорошая идея подарка на праздник {occasion}",
    "К празднику {occasion} такие очки станут приятным сюрпризом",
    "Если ищете подарок на {occasion}, эта модель точно не затеряется",
];

pub const GIFT: &[&str] = &[
    "Отличный подарочный вариант для стильной девушки или парня",
    "Можно взять себе или на подарок — смотрятся презентабельно",
    "Хороший вариант в подарок: стильный аксессуар, который реально носят",
];

pub const TONE_PREMIUM: &[&str] = &[
    "Продуманные детали и аккуратная отделка создают ощущение премиального аксессуара",
    "Сдержанная роскошь модели выигрышно смотрится в дорогом образе",
];

pub const TONE_SOCIAL: &[&str] = &[
    "Отличный вариант для фото и социальных сетей",
    "В кадре очки смотрятся эффектно и добавляют снимкам настроения",
];

pub const TONE_MARKET: &[&str] = &[
    "Практичная модель на каждый день по разумной цене",
    "Надёжный аксессуар, который не жалко брать в дорогу",
];

pub const DISCLAIMER: &[&str] = &[
    "Футляр может отличаться",
    "Комплектация может отличаться",
    "Оттенок может немного отличаться из-за настроек экрана",
];

/// Keyword sentences woven between content blocks.
pub const SEO_PHRASES: &[&str] = &[
    "Такие {core} часто выбирают как {kind}",
    "{core} удобны для города и отдыха",
    "{kind} хорошо дополняют повседневный образ",
    "{core} подходят для отпуска и прогулок",
    "{kind} — стильный акцент на каждый день",
    "Многие ищут именно {audience_kw} с таким дизайном",
    "{core} с линзами {lens} выручают в самый солнечный день",
];

const BUILTIN_BRANDS: &[(&str, &str)] = &[
    ("ray ban", "Рэй Бэн"),
    ("dior", "Диор"),
    ("gucci", "Гуччи"),
    ("prada", "Прада"),
    ("chanel", "Шанель"),
    ("versace", "Версаче"),
    ("oakley", "Окли"),
    ("persol", "Персол"),
    ("tom ford", "Том Форд"),
    ("cartier", "Картье"),
    ("dolce gabbana", "Дольче Габбана"),
    ("miu miu", "Миу Миу"),
];

/// Values substituted into phrase templates.
#[derive(Debug, Clone, Default)]
pub struct Vars<'a> {
    pub brand: &'a str,
    pub shape: &'a str,
    pub lens: &'a str,
    pub collection: &'a str,
    pub occasion: &'a str,
    pub core: &'a str,
    pub kind: &'a str,
    pub audience_kw: &'a str,
}

impl<'a> Vars<'a> {
    fn get(&self, key: &str) -> Option<&'a str> {
        match key {
            "brand" => Some(self.brand),
            "shape" => Some(self.shape),
            "lens" => Some(self.lens),
            "collection" => Some(self.collection),
            "occasion" => Some(self.occasion),
            "core" => Some(self.core),
            "kind" => Some(self.kind),
            "audience_kw" => Some(self.audience_kw),
            _ => None,
        }
    }
}

/// Substitutes placeholders. Returns `None` when a placeholder has no value.
pub fn render(template: &str, vars: &Vars<'_>) -> Option<String> {
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('}')?;
        let value = vars.get(&after[..end])?.trim();
        if value.is_empty() {
            return None;
        }
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Some(collapse_whitespace(&out))
}

/// Every template of `pool` that renders with the given values.
pub fn renderable(pool: &[&str], vars: &Vars<'_>) -> Vec<String> {
    pool.iter().filter_map(|t| render(t, vars)).collect()
}

pub fn normalize_brand_key(brand: &str) -> String {
    collapse_whitespace(&brand.trim().to_lowercase().replace(['&', '-'], " "))
}

fn read_brand_file(path: &Path) -> Result<HashMap<String, String>> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Latin brand name → localized display name.
#[derive(Debug, Clone, Default)]
pub struct BrandMap {
    entries: HashMap<String, String>,
}

impl BrandMap {
    pub fn builtin() -> Self {
        let entries = BUILTIN_BRANDS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { entries }
    }

    /// Built-in entries overlaid with `brands_ru.json`. An unreadable file leaves the
    /// built-in map in place.
    pub fn load(path: &Path) -> Self {
        let mut map = Self::builtin();
        if !path.exists() {
            return map;
        }
        match read_brand_file(path) {
            Ok(raw) => {
                for (k, v) in raw {
                    map.insert(&k, &v);
                }
            }
            Err(e) => log::warn!("Ignoring brand map {}: {}", path.display(), e),
        }
        map
    }

    pub fn insert(&mut self, brand: &str, localized: &str) {
        let localized = localized.trim();
        if !localized.is_empty() {
            self.entries.insert(normalize_brand_key(brand), localized.to_string());
        }
    }

    pub fn localize(&self, brand: &str) -> Option<&str> {
        self.entries.get(&normalize_brand_key(brand)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Data that can be overridden from the data directory.
#[derive(Debug, Clone)]
pub struct Lexicon {
    pub slogans: Vec<String>,
    pub brands: BrandMap,
}

impl Lexicon {
    pub fn builtin() -> Self {
        Self {
            slogans: SLOGANS.iter().map(|s| s.to_string()).collect(),
            brands: BrandMap::builtin(),
        }
    }

    pub fn load(data_dir: &Path) -> Self {
        let mut lexicon = Self::builtin();
        lexicon.brands = BrandMap::load(&data_dir.join(BRAND_MAP_FILE));

        let slogans_path = data_dir.join(SLOGANS_FILE);
        if let Ok(raw) = fs::read_to_string(&slogans_path) {
            let custom: Vec<String> = raw
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();
            if !custom.is_empty() {
                log::info!("Loaded {} openers from {}", custom.len(), slogans_path.display());
                lexicon.slogans = custom;
            }
        }
        lexicon
    }
}
