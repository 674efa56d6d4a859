//! Fixed projections from relational rows to graph properties.

use serde_json::Value as JsonValue;

use crate::models::{
    ManagerRow, ManagerTeamRow, PlayerManagerRow, PlayerRow, PlayerTeamRow, TeamRow,
};
use crate::store::{Properties, RelationshipRow};

fn opt_str(value: &Option<String>) -> JsonValue {
    value.as_deref().map(JsonValue::from).unwrap_or(JsonValue::Null)
}

pub fn player_properties(player: &PlayerRow) -> Properties {
    let full_name = player.full_name.as_ref().or(player.name.as_ref());
    let mut props = Properties::new();
    props.insert("id".into(), player.id.to_json());
    props.insert("name".into(), opt_str(&player.name));
    props.insert(
        "fullName".into(),
        full_name.map(|n| JsonValue::from(n.as_str())).unwrap_or(JsonValue::Null),
    );
    props.insert("nationality".into(), opt_str(&player.nationality));
    props.insert("position".into(), opt_str(&player.position));
    props.insert("birthDate".into(), opt_str(&player.birth_date));
    props
}

pub fn team_properties(team: &TeamRow) -> Properties {
    let mut props = Properties::new();
    props.insert("id".into(), team.id.to_json());
    props.insert("name".into(), opt_str(&team.name));
    props.insert("country".into(), opt_str(&team.country));
    props.insert("league".into(), opt_str(&team.league));
    props.insert(
        "foundedYear".into(),
        team.founded_year.map(JsonValue::from).unwrap_or(JsonValue::Null),
    );
    props
}

pub fn manager_properties(manager: &ManagerRow) -> Properties {
    let mut props = Properties::new();
    props.insert("id".into(), manager.id.to_json());
    props.insert("name".into(), opt_str(&manager.name));
    props.insert("nationality".into(), opt_str(&manager.nationality));
    props.insert("birthDate".into(), opt_str(&manager.birth_date));
    props
}

pub fn national_team_name(country: &str) -> String {
    format!("{country} National Team")
}

pub fn national_team_properties(country: &str) -> Properties {
    let mut props = Properties::new();
    props.insert("country".into(), country.into());
    props.insert("name".into(), national_team_name(country).into());
    props
}

pub fn played_for(row: &PlayerTeamRow) -> Option<RelationshipRow> {
    let mut props = Properties::new();
    props.insert("startDate".into(), opt_str(&row.start_date));
    props.insert("endDate".into(), opt_str(&row.end_date));
    props.insert("loan".into(), row.loan.unwrap_or(false).into());
    props.insert("current".into(), row.end_date.is_none().into());
    Some(RelationshipRow {
        from: row.player_id.to_json(),
        to: row.team_id.to_json(),
        properties: props,
    })
}

pub fn represents(player: &PlayerRow) -> Option<RelationshipRow> {
    let country = player.country()?;
    Some(RelationshipRow {
        from: player.id.to_json(),
        to: country.into(),
        properties: Properties::new(),
    })
}

pub fn managed_by(row: &PlayerManagerRow) -> Option<RelationshipRow> {
    let mut props = Properties::new();
    props.insert("startDate".into(), opt_str(&row.start_date));
    props.insert("endDate".into(), opt_str(&row.end_date));
    Some(RelationshipRow {
        from: row.player_id.to_json(),
        to: row.manager_id.to_json(),
        properties: props,
    })
}

pub fn managed(row: &ManagerTeamRow) -> Option<RelationshipRow> {
    let mut props = Properties::new();
    props.insert("startDate".into(), opt_str(&row.start_date));
    props.insert("endDate".into(), opt_str(&row.end_date));
    props.insert("current".into(), row.end_date.is_none().into());
    Some(RelationshipRow {
        from: row.manager_id.to_json(),
        to: row.team_id.to_json(),
        properties: props,
    })
}
