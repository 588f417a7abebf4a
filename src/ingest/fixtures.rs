/// Test fixtures: representative XML payloads from the Seoul city data API.
///
/// Structurally faithful to
///   http://openapi.seoul.go.kr:8088/{key}/xml/citydata/1/5/{area}
/// but trimmed to the blocks the parser reads, plus one unrelated block
/// (road traffic, weather) to prove it is ignored.
///
/// Response shape:
///   SeoulRtd.citydata
///     RESULT/RESULT.CODE, RESULT/RESULT.MESSAGE
///     CITYDATA
///       AREA_NM, AREA_CD
///       LIVE_PPLTN_STTS/LIVE_PPLTN_STTS
///         AREA_CONGEST_LVL, AREA_CONGEST_MSG, AREA_PPLTN_MIN/MAX, PPLTN_TIME
///         FCST_PPLTN/FCST_PPLTN[]
///       LIVE_CMRCL_STTS
///         AREA_CMRCL_LVL, AREA_SH_PAYMENT_CNT, AREA_SH_PAYMENT_AMT_MIN/MAX
///         CMRCL_RSB/CMRCL_RSB[]
///
/// Note: every value is element text. Numbers arrive as strings.

use chrono::{Duration, NaiveDate};

/// 광화문·덕수궁 (POI009): live status, two forecasts, commercial block
/// with three industry rows.
pub(crate) fn fixture_gwanghwamun_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<SeoulRtd.citydata xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <list_total_count>1</list_total_count>
  <RESULT>
    <RESULT.CODE>INFO-000</RESULT.CODE>
    <RESULT.MESSAGE>정상 처리되었습니다.</RESULT.MESSAGE>
  </RESULT>
  <CITYDATA>
    <AREA_NM>광화문·덕수궁</AREA_NM>
    <AREA_CD>POI009</AREA_CD>
    <LIVE_PPLTN_STTS>
      <LIVE_PPLTN_STTS>
        <AREA_NM>광화문·덕수궁</AREA_NM>
        <AREA_CD>POI009</AREA_CD>
        <AREA_CONGEST_LVL>보통</AREA_CONGEST_LVL>
        <AREA_CONGEST_MSG>사람이 몰려있을 수 있지만 크게 붐비지는 않아요.</AREA_CONGEST_MSG>
        <AREA_PPLTN_MIN>36000</AREA_PPLTN_MIN>
        <AREA_PPLTN_MAX>38000</AREA_PPLTN_MAX>
        <MALE_PPLTN_RATE>48.3</MALE_PPLTN_RATE>
        <FEMALE_PPLTN_RATE>51.7</FEMALE_PPLTN_RATE>
        <PPLTN_TIME>2024-05-01 14:30</PPLTN_TIME>
        <FCST_YN>Y</FCST_YN>
        <FCST_PPLTN>
          <FCST_PPLTN>
            <FCST_TIME>2024-05-01 15:00</FCST_TIME>
            <FCST_CONGEST_LVL>보통</FCST_CONGEST_LVL>
            <FCST_PPLTN_MIN>36000</FCST_PPLTN_MIN>
            <FCST_PPLTN_MAX>38000</FCST_PPLTN_MAX>
          </FCST_PPLTN>
          <FCST_PPLTN>
            <FCST_TIME>2024-05-01 16:00</FCST_TIME>
            <FCST_CONGEST_LVL>약간 붐빔</FCST_CONGEST_LVL>
            <FCST_PPLTN_MIN>40000</FCST_PPLTN_MIN>
            <FCST_PPLTN_MAX>42000</FCST_PPLTN_MAX>
          </FCST_PPLTN>
        </FCST_PPLTN>
      </LIVE_PPLTN_STTS>
    </LIVE_PPLTN_STTS>
    <ROAD_TRAFFIC_STTS>
      <AVG_ROAD_DATA>
        <ROAD_MSG>전체도로소통평균현황 원활</ROAD_MSG>
        <ROAD_TRAFFIC_IDX>원활</ROAD_TRAFFIC_IDX>
        <ROAD_TRAFFIC_SPD>24</ROAD_TRAFFIC_SPD>
      </AVG_ROAD_DATA>
    </ROAD_TRAFFIC_STTS>
    <LIVE_CMRCL_STTS>
      <AREA_CMRCL_LVL>분주한</AREA_CMRCL_LVL>
      <AREA_SH_PAYMENT_CNT>1250</AREA_SH_PAYMENT_CNT>
      <AREA_SH_PAYMENT_AMT_MIN>36000000</AREA_SH_PAYMENT_AMT_MIN>
      <AREA_SH_PAYMENT_AMT_MAX>40000000</AREA_SH_PAYMENT_AMT_MAX>
      <CMRCL_RSB>
        <CMRCL_RSB>
          <RSB_LRG_CTGR>음식·음료</RSB_LRG_CTGR>
          <RSB_MID_CTGR>한식</RSB_MID_CTGR>
          <RSB_PAYMENT_LVL>분주한</RSB_PAYMENT_LVL>
          <RSB_SH_PAYMENT_CNT>420</RSB_SH_PAYMENT_CNT>
          <RSB_SH_PAYMENT_AMT_MIN>12000000</RSB_SH_PAYMENT_AMT_MIN>
          <RSB_SH_PAYMENT_AMT_MAX>13000000</RSB_SH_PAYMENT_AMT_MAX>
        </CMRCL_RSB>
        <CMRCL_RSB>
          <RSB_LRG_CTGR>음식·음료</RSB_LRG_CTGR>
          <RSB_MID_CTGR>커피/음료</RSB_MID_CTGR>
          <RSB_PAYMENT_LVL>보통</RSB_PAYMENT_LVL>
          <RSB_SH_PAYMENT_CNT>310</RSB_SH_PAYMENT_CNT>
          <RSB_SH_PAYMENT_AMT_MIN>3000000</RSB_SH_PAYMENT_AMT_MIN>
          <RSB_SH_PAYMENT_AMT_MAX>3500000</RSB_SH_PAYMENT_AMT_MAX>
        </CMRCL_RSB>
        <CMRCL_RSB>
          <RSB_LRG_CTGR>유통</RSB_LRG_CTGR>
          <RSB_MID_CTGR>편의점</RSB_MID_CTGR>
          <RSB_PAYMENT_LVL>한산한</RSB_PAYMENT_LVL>
          <RSB_SH_PAYMENT_CNT>95</RSB_SH_PAYMENT_CNT>
          <RSB_SH_PAYMENT_AMT_MIN>800000</RSB_SH_PAYMENT_AMT_MIN>
          <RSB_SH_PAYMENT_AMT_MAX>900000</RSB_SH_PAYMENT_AMT_MAX>
        </CMRCL_RSB>
      </CMRCL_RSB>
    </LIVE_CMRCL_STTS>
    <WEATHER_STTS>
      <WEATHER_STTS>
        <TEMP>19.2</TEMP>
        <PRECIPITATION>-</PRECIPITATION>
      </WEATHER_STTS>
    </WEATHER_STTS>
  </CITYDATA>
</SeoulRtd.citydata>"#
}

/// Builds a minimal document with `forecasts` forecast entries at hourly
/// steps after 2024-01-01 10:00, optionally with a commercial block holding
/// one industry row. `AREA_PPLTN_MIN` is always 30000.
pub(crate) fn citydata_xml(
    area_code: &str,
    ppltn_time: &str,
    congestion: &str,
    forecasts: usize,
    commercial: bool,
) -> String {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .expect("valid base time");

    let mut fcst = String::new();
    if forecasts > 0 {
        fcst.push_str("<FCST_PPLTN>");
        for i in 0..forecasts {
            let t = base + Duration::hours(i as i64 + 1);
            fcst.push_str(&format!(
                "<FCST_PPLTN><FCST_TIME>{}</FCST_TIME><FCST_CONGEST_LVL>여유</FCST_CONGEST_LVL>\
                 <FCST_PPLTN_MIN>{}</FCST_PPLTN_MIN><FCST_PPLTN_MAX>{}</FCST_PPLTN_MAX></FCST_PPLTN>",
                t.format("%Y-%m-%d %H:%M"),
                1000 + i,
                2000 + i
            ));
        }
        fcst.push_str("</FCST_PPLTN>");
    }

    let cmrcl = if commercial {
        "<LIVE_CMRCL_STTS><AREA_CMRCL_LVL>보통</AREA_CMRCL_LVL>\
         <AREA_SH_PAYMENT_CNT>100</AREA_SH_PAYMENT_CNT>\
         <AREA_SH_PAYMENT_AMT_MIN>1000000</AREA_SH_PAYMENT_AMT_MIN>\
         <AREA_SH_PAYMENT_AMT_MAX>2000000</AREA_SH_PAYMENT_AMT_MAX>\
         <CMRCL_RSB><CMRCL_RSB><RSB_LRG_CTGR>음식·음료</RSB_LRG_CTGR>\
         <RSB_MID_CTGR>한식</RSB_MID_CTGR><RSB_PAYMENT_LVL>보통</RSB_PAYMENT_LVL>\
         <RSB_SH_PAYMENT_CNT>40</RSB_SH_PAYMENT_CNT></CMRCL_RSB></CMRCL_RSB>\
         </LIVE_CMRCL_STTS>"
    } else {
        ""
    };

    format!(
        "<SeoulRtd.citydata><RESULT><RESULT.CODE>INFO-000</RESULT.CODE>\
         <RESULT.MESSAGE>정상 처리되었습니다.</RESULT.MESSAGE></RESULT>\
         <CITYDATA><AREA_NM>{area}</AREA_NM><AREA_CD>{area}</AREA_CD>\
         <LIVE_PPLTN_STTS><LIVE_PPLTN_STTS>\
         <AREA_CONGEST_LVL>{congestion}</AREA_CONGEST_LVL>\
         <AREA_CONGEST_MSG>여유로워요.</AREA_CONGEST_MSG>\
         <AREA_PPLTN_MIN>30000</AREA_PPLTN_MIN><AREA_PPLTN_MAX>32000</AREA_PPLTN_MAX>\
         <PPLTN_TIME>{time}</PPLTN_TIME>{fcst}\
         </LIVE_PPLTN_STTS></LIVE_PPLTN_STTS>{cmrcl}</CITYDATA></SeoulRtd.citydata>",
        area = area_code,
        congestion = congestion,
        time = ppltn_time,
        fcst = fcst,
        cmrcl = cmrcl,
    )
}

/// First forecast has only a time, second has nothing but a level.
pub(crate) fn fixture_sparse_forecast_xml() -> &'static str {
    r#"<SeoulRtd.citydata>
  <CITYDATA>
    <AREA_CD>POI014</AREA_CD>
    <LIVE_PPLTN_STTS>
      <LIVE_PPLTN_STTS>
        <AREA_CONGEST_LVL>붐빔</AREA_CONGEST_LVL>
        <PPLTN_TIME>2024-05-01 14:30</PPLTN_TIME>
        <FCST_PPLTN>
          <FCST_PPLTN>
            <FCST_TIME>2024-05-01 15:00</FCST_TIME>
          </FCST_PPLTN>
          <FCST_PPLTN>
            <FCST_CONGEST_LVL>붐빔</FCST_CONGEST_LVL>
          </FCST_PPLTN>
        </FCST_PPLTN>
      </LIVE_PPLTN_STTS>
    </LIVE_PPLTN_STTS>
  </CITYDATA>
</SeoulRtd.citydata>"#
}

/// Commercial summary published, industry breakdown absent.
pub(crate) fn fixture_commercial_without_industries_xml() -> &'static str {
    r#"<SeoulRtd.citydata>
  <CITYDATA>
    <AREA_CD>POI050</AREA_CD>
    <LIVE_PPLTN_STTS>
      <LIVE_PPLTN_STTS>
        <AREA_CONGEST_LVL>여유</AREA_CONGEST_LVL>
        <PPLTN_TIME>2024-05-01 06:10</PPLTN_TIME>
      </LIVE_PPLTN_STTS>
    </LIVE_PPLTN_STTS>
    <LIVE_CMRCL_STTS>
      <AREA_CMRCL_LVL>한산한</AREA_CMRCL_LVL>
      <AREA_SH_PAYMENT_CNT>12</AREA_SH_PAYMENT_CNT>
    </LIVE_CMRCL_STTS>
  </CITYDATA>
</SeoulRtd.citydata>"#
}

/// Two industry rows: the first has no mid category and must be dropped.
pub(crate) fn fixture_industry_missing_category_xml() -> &'static str {
    r#"<SeoulRtd.citydata>
  <CITYDATA>
    <AREA_CD>POI060</AREA_CD>
    <LIVE_PPLTN_STTS>
      <LIVE_PPLTN_STTS>
        <PPLTN_TIME>2024-05-01 12:00</PPLTN_TIME>
      </LIVE_PPLTN_STTS>
    </LIVE_PPLTN_STTS>
    <LIVE_CMRCL_STTS>
      <AREA_CMRCL_LVL>보통</AREA_CMRCL_LVL>
      <CMRCL_RSB>
        <CMRCL_RSB>
          <RSB_LRG_CTGR>음식·음료</RSB_LRG_CTGR>
          <RSB_MID_CTGR></RSB_MID_CTGR>
          <RSB_SH_PAYMENT_CNT>10</RSB_SH_PAYMENT_CNT>
        </CMRCL_RSB>
        <CMRCL_RSB>
          <RSB_LRG_CTGR>음식·음료</RSB_LRG_CTGR>
          <RSB_MID_CTGR>커피/음료</RSB_MID_CTGR>
          <RSB_PAYMENT_LVL>보통</RSB_PAYMENT_LVL>
        </CMRCL_RSB>
      </CMRCL_RSB>
    </LIVE_CMRCL_STTS>
  </CITYDATA>
</SeoulRtd.citydata>"#
}

pub(crate) fn fixture_missing_area_code_xml() -> &'static str {
    r#"<SeoulRtd.citydata>
  <CITYDATA>
    <AREA_NM>강남역</AREA_NM>
    <LIVE_PPLTN_STTS>
      <LIVE_PPLTN_STTS>
        <AREA_CONGEST_LVL>붐빔</AREA_CONGEST_LVL>
        <PPLTN_TIME>2024-05-01 14:30</PPLTN_TIME>
      </LIVE_PPLTN_STTS>
    </LIVE_PPLTN_STTS>
  </CITYDATA>
</SeoulRtd.citydata>"#
}

pub(crate) fn fixture_missing_ppltn_time_xml() -> &'static str {
    r#"<SeoulRtd.citydata>
  <CITYDATA>
    <AREA_CD>POI001</AREA_CD>
    <LIVE_PPLTN_STTS>
      <LIVE_PPLTN_STTS>
        <AREA_CONGEST_LVL>붐빔</AREA_CONGEST_LVL>
        <AREA_PPLTN_MIN>30000</AREA_PPLTN_MIN>
      </LIVE_PPLTN_STTS>
    </LIVE_PPLTN_STTS>
  </CITYDATA>
</SeoulRtd.citydata>"#
}

/// Container present, live-status list empty. Seen for areas the API has
/// temporarily stopped publishing.
pub(crate) fn fixture_empty_live_status_xml() -> &'static str {
    r#"<SeoulRtd.citydata>
  <CITYDATA>
    <AREA_NM>북서울꿈의숲</AREA_NM>
    <AREA_CD>POI101</AREA_CD>
    <LIVE_PPLTN_STTS></LIVE_PPLTN_STTS>
  </CITYDATA>
</SeoulRtd.citydata>"#
}

/// Service-side failure: envelope with RESULT but no CITYDATA.
pub(crate) fn fixture_no_citydata_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<SeoulRtd.citydata>
  <list_total_count>0</list_total_count>
  <RESULT>
    <RESULT.CODE>ERROR-500</RESULT.CODE>
    <RESULT.MESSAGE>서버 오류입니다.</RESULT.MESSAGE>
  </RESULT>
</SeoulRtd.citydata>"#
}

/// Generic open-API error document: RESULT is the root element.
pub(crate) fn fixture_bare_result_error_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<RESULT>
  <CODE>INFO-200</CODE>
  <MESSAGE>해당하는 데이터가 없습니다.</MESSAGE>
</RESULT>"#
}
