//! Static categorical code tables published with the road-collision dataset.

use std::collections::BTreeMap;

use super::Code;

const UNKNOWN: &str = "Unknown";

const COLLISION_SEVERITY: &[(i64, &str)] = &[(1, "Fatal"), (2, "Serious"), (3, "Slight")];

const ENHANCED_SEVERITY_COLLISION: &[(i64, &str)] = &[
    (1, "Fatal"),
    (5, "Very Serious"),
    (6, "Moderately Serious"),
    (7, "Less Serious"),
    (3, "Slight"),
    (-1, UNKNOWN),
];

const DAY_OF_WEEK: &[(i64, &str)] = &[
    (1, "Sunday"),
    (2, "Monday"),
    (3, "Tuesday"),
    (4, "Wednesday"),
    (5, "Thursday"),
    (6, "Friday"),
    (7, "Saturday"),
];

const FIRST_ROAD_CLASS: &[(i64, &str)] = &[
    (1, "Motorway"),
    (2, "A(M)"),
    (3, "A"),
    (4, "B"),
    (5, "C"),
    (6, "Unclassified"),
    (-1, UNKNOWN),
];

const ROAD_TYPE: &[(i64, &str)] = &[
    (1, "Roundabout"),
    (2, "One way street"),
    (3, "Dual carriageway"),
    (6, "Single carriageway"),
    (7, "Slip road"),
    (12, "One way street/Slip road"),
    (9, UNKNOWN),
    (-1, UNKNOWN),
];

const JUNCTION_DETAIL_HISTORIC: &[(i64, &str)] = &[
    (0, "Not at junction or within 20 metres"),
    (1, "Roundabout"),
    (2, "Mini-roundabout"),
    (3, "T or staggered junction"),
    (5, "Slip road"),
    (6, "Crossroads"),
    (7, "More than 4 arms (not roundabout)"),
    (8, "Private drive or entrance"),
    (9, "Other junction"),
    (99, UNKNOWN),
    (-1, UNKNOWN),
];

const JUNCTION_DETAIL: &[(i64, &str)] = &[
    (0, "Not at junction or within 20 metres"),
    (13, "T or staggered junction"),
    (16, "Crossroads"),
    (17, "Junction with more than four arms (not roundabout)"),
    (18, "Using private drive or entrance"),
    (19, "Other junction"),
    (99, UNKNOWN),
    (-1, UNKNOWN),
];

const JUNCTION_CONTROL: &[(i64, &str)] = &[
    (0, "Not at junction or within 20 metres"),
    (1, "Authorised person"),
    (2, "Auto traffic signal"),
    (3, "Stop sign"),
    (4, "Give way or uncontrolled"),
    (-1, UNKNOWN),
    (9, UNKNOWN),
];

const SECOND_ROAD_CLASS: &[(i64, &str)] = &[
    (0, "Not at junction or within 20 metres"),
    (1, "Motorway"),
    (2, "A(M)"),
    (3, "A"),
    (4, "B"),
    (5, "C"),
    (6, "Unclassified"),
    (9, UNKNOWN),
    (-1, UNKNOWN),
];

const PEDESTRIAN_CROSSING_HUMAN_CONTROL_HISTORIC: &[(i64, &str)] = &[
    (0, "None within 50 metres"),
    (1, "Control by school crossing patrol"),
    (2, "Control by other authorised person"),
    (-1, UNKNOWN),
    (9, UNKNOWN),
];

const PEDESTRIAN_CROSSING_PHYSICAL_FACILITIES_HISTORIC: &[(i64, &str)] = &[
    (0, "No physical crossing facilities within 50 metres"),
    (1, "Zebra"),
    (
        4,
        "Pelican, puffin, toucan or similar non-junction pedestrian light crossing",
    ),
    (5, "Pedestrian phase at traffic signal junction"),
    (7, "Footbridge or subway"),
    (8, "Central refuge"),
    (-1, UNKNOWN),
    (9, UNKNOWN),
];

const PEDESTRIAN_CROSSING: &[(i64, &str)] = &[
    (0, "No physical crossing facility within 50m"),
    (11, "Human crossing control by school crossing patrol"),
    (12, "Human crossing control by other authorised person"),
    (13, "Zebra crossing"),
    (
        14,
        "Pedestrian light crossing (pelican or puffin or toucan or similar)",
    ),
    (15, "Pedestrian phase at traffic signal"),
    (16, "Footbridge or subway"),
    (17, "Central refuge - no other controls"),
    (99, UNKNOWN),
    (-1, UNKNOWN),
];

const LIGHT_CONDITIONS: &[(i64, &str)] = &[
    (1, "Daylight"),
    (4, "Darkness - lights lit"),
    (5, "Darkness - lights unlit"),
    (6, "Darkness - no lighting"),
    (7, "Darkness - lighting unknown"),
    (-1, UNKNOWN),
];

const WEATHER_CONDITIONS: &[(i64, &str)] = &[
    (1, "Fine no high winds"),
    (2, "Raining no high winds"),
    (3, "Snowing no high winds"),
    (4, "Fine + high winds"),
    (5, "Raining + high winds"),
    (6, "Snowing + high winds"),
    (7, "Fog or mist"),
    (8, "Other"),
    (9, UNKNOWN),
    (-1, UNKNOWN),
];

const ROAD_SURFACE_CONDITIONS: &[(i64, &str)] = &[
    (1, "Dry"),
    (2, "Wet or damp"),
    (3, "Snow"),
    (4, "Frost or ice"),
    (5, "Flood over 3cm. deep"),
    (6, "Oil or diesel"),
    (7, "Mud"),
    (-1, UNKNOWN),
    (9, UNKNOWN),
];

const SPECIAL_CONDITIONS_AT_SITE: &[(i64, &str)] = &[
    (0, "None"),
    (1, "Auto traffic signal - out"),
    (2, "Auto signal part defective"),
    (3, "Road sign or marking defective or obscured"),
    (4, "Roadworks"),
    (5, "Road surface defective"),
    (6, "Oil or diesel"),
    (7, "Mud"),
    (-1, UNKNOWN),
    (9, UNKNOWN),
];

const CARRIAGEWAY_HAZARDS_HISTORIC: &[(i64, &str)] = &[
    (0, "None"),
    (1, "Vehicle load on road"),
    (2, "Other object on road"),
    (3, "Previous accident"),
    (4, "Dog on road"),
    (5, "Other animal on road"),
    (6, "Pedestrian in carriageway - not injured"),
    (7, "Any animal in carriageway (except ridden horse)"),
    (-1, UNKNOWN),
    (9, UNKNOWN),
];

const CARRIAGEWAY_HAZARDS: &[(i64, &str)] = &[
    (0, "None"),
    (11, "Defective traffic signals"),
    (
        12,
        "Permanent road signing or markings defective or obscured or inadequate",
    ),
    (13, "Roadworks"),
    (14, "Oil or diesel"),
    (15, "Mud"),
    (16, "Dislodged vehicle load in carriageway"),
    (17, "Other object in carriageway"),
    (18, "Involvement with previous collision"),
    (19, "Pedestrian in carriageway - not injured"),
    (20, "Any animal in carriageway (except ridden horse)"),
    (21, "Poor or defective road surface"),
    (-1, UNKNOWN),
    (99, UNKNOWN),
];

const URBAN_OR_RURAL_AREA: &[(i64, &str)] = &[
    (1, "Urban"),
    (2, "Rural"),
    (3, "Unallocated"),
    (-1, UNKNOWN),
];

const DID_POLICE_OFFICER_ATTEND_SCENE_OF_ACCIDENT: &[(i64, &str)] = &[
    (1, "Yes"),
    (2, "No"),
    (
        3,
        "No - accident was reported using a self completion  form (self rep only)",
    ),
    (-1, UNKNOWN),
];

const TRUNK_ROAD_FLAG: &[(i64, &str)] = &[
    (1, "Trunk (Roads managed by Highways England)"),
    (2, "Non-trunk"),
    (-1, UNKNOWN),
];

const COLLISION_INJURY_BASED: &[(i64, &str)] = &[
    (0, "Based on severity reporting"),
    (1, "Based on Injury code reporting"),
];

const TABLES: &[(&str, &[(i64, &str)])] = &[
    ("collision_severity", COLLISION_SEVERITY),
    ("enhanced_severity_collision", ENHANCED_SEVERITY_COLLISION),
    ("day_of_week", DAY_OF_WEEK),
    ("first_road_class", FIRST_ROAD_CLASS),
    ("road_type", ROAD_TYPE),
    ("junction_detail_historic", JUNCTION_DETAIL_HISTORIC),
    ("junction_detail", JUNCTION_DETAIL),
    ("junction_control", JUNCTION_CONTROL),
    ("second_road_class", SECOND_ROAD_CLASS),
    (
        "pedestrian_crossing_human_control_historic",
        PEDESTRIAN_CROSSING_HUMAN_CONTROL_HISTORIC,
    ),
    (
        "pedestrian_crossing_physical_facilities_historic",
        PEDESTRIAN_CROSSING_PHYSICAL_FACILITIES_HISTORIC,
    ),
    ("pedestrian_crossing", PEDESTRIAN_CROSSING),
    ("light_conditions", LIGHT_CONDITIONS),
    ("weather_conditions", WEATHER_CONDITIONS),
    ("road_surface_conditions", ROAD_SURFACE_CONDITIONS),
    ("special_conditions_at_site", SPECIAL_CONDITIONS_AT_SITE),
    ("carriageway_hazards_historic", CARRIAGEWAY_HAZARDS_HISTORIC),
    ("carriageway_hazards", CARRIAGEWAY_HAZARDS),
    ("urban_or_rural_area", URBAN_OR_RURAL_AREA),
    (
        "did_police_officer_attend_scene_of_accident",
        DID_POLICE_OFFICER_ATTEND_SCENE_OF_ACCIDENT,
    ),
    ("trunk_road_flag", TRUNK_ROAD_FLAG),
    ("collision_injury_based", COLLISION_INJURY_BASED),
];

/// The static categorical tables keyed by column name.
pub fn builtin_tables() -> BTreeMap<String, BTreeMap<Code, String>> {
    TABLES
        .iter()
        .map(|(column, entries)| {
            let map = entries
                .iter()
                .map(|(code, label)| (Code::Int(*code), (*label).to_string()))
                .collect();
            ((*column).to_string(), map)
        })
        .collect()
}
