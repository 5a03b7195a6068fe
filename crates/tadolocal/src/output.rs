//! Plain-text table rendering for listings.

use tabled::{Table, Tabled};

use tadolocal_core::{Device, HotWaterOperation, SyncState, Zone, ZoneKind};

// ── Zones ────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "KIND")]
    kind: &'static str,
    #[tabled(rename = "TEMP")]
    temperature: String,
    #[tabled(rename = "TARGET")]
    target: String,
    #[tabled(rename = "HUMIDITY")]
    humidity: String,
    #[tabled(rename = "ACTIVITY")]
    activity: String,
}

pub fn zones_table(state: &SyncState) -> String {
    Table::new(state.zones.iter().map(zone_row)).to_string()
}

fn zone_row(zone: &Zone) -> ZoneRow {
    match zone.kind {
        ZoneKind::Standard => ZoneRow {
            id: zone.id.to_string(),
            name: zone.name.clone(),
            kind: "standard",
            temperature: fmt_temp(zone.state.cur_temp_c),
            target: fmt_temp(zone.state.target_temp_c),
            humidity: zone
                .state
                .hum_perc
                .map_or_else(|| "-".to_owned(), |h| format!("{h:.0}%")),
            activity: if zone.state.heating_active() {
                "heating".to_owned()
            } else {
                "idle".to_owned()
            },
        },
        ZoneKind::HotWater => {
            let hot_water = zone.state.hot_water.clone().unwrap_or_default();
            ZoneRow {
                id: zone.id.to_string(),
                name: zone.name.clone(),
                kind: "hot water",
                temperature: "-".to_owned(),
                target: fmt_temp(hot_water.target_temp_c),
                humidity: "-".to_owned(),
                activity: match hot_water.operation() {
                    HotWaterOperation::Off => "off".to_owned(),
                    HotWaterOperation::Auto => "schedule".to_owned(),
                    HotWaterOperation::Heat => "heating".to_owned(),
                },
            }
        }
    }
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "SERIAL")]
    serial: String,
    #[tabled(rename = "MODEL")]
    model: String,
    #[tabled(rename = "ZONE")]
    zone: String,
    #[tabled(rename = "BATTERY")]
    battery: &'static str,
}

pub fn devices_table(state: &SyncState) -> String {
    Table::new(state.devices.iter().map(device_row)).to_string()
}

fn device_row(device: &Device) -> DeviceRow {
    DeviceRow {
        id: device.id.to_string(),
        serial: device.serial.clone(),
        model: device.model_name(),
        zone: device
            .zone_id
            .as_ref()
            .map_or_else(|| "-".to_owned(), ToString::to_string),
        battery: if device.state.is_battery_low() {
            "LOW"
        } else {
            "ok"
        },
    }
}

fn fmt_temp(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_owned(), |t| format!("{t:.1}°C"))
}
