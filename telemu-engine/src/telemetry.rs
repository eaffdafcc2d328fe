//! Flat telemetry record published for downstream consumers.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::NOMINAL_TIRE_PRESSURE;
use crate::numbers::round_to_i32;

/// Cabin and body signals the emulator does not animate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CabinStatus {
    pub ac_stat: u8,
    pub acc_mode: bool,
    pub aud_mode_adv: bool,
    pub aus: bool,
    pub auto_stat: u8,
    pub autodfgstat: u8,
    pub cell_vr: u8,
    pub cruise_tgl: bool,
    pub defrost_sel: bool,
    pub dn_arw_step_rq: u8,
    pub dr_lk_stat: u8,
    pub ebl_stat: u8,
    pub engcooltemp: u8,
    pub engstyle: u8,
    pub fg_ajar: bool,
    pub fl_hs_stat: u8,
    pub fl_vs_stat: u8,
    pub fr_hs_stat: u8,
    pub fr_vs_stat: u8,
    pub ft_drv_atc_temp: u8,
    pub ft_drv_mtc_temp: u8,
    pub ft_hvac_blw_fn_sp: u8,
    pub ft_hvac_ctrl_stat: u8,
    pub ft_hvac_md_stat: u8,
    pub ft_psg_atc_temp: u8,
    pub ft_psg_mtc_temp: u8,
    pub hibmlvr_stat: u8,
    pub hl_stat: u8,
    pub hrnsw_psd: bool,
    pub hrnswpsd: bool,
    pub hsw_stat: bool,
    pub l_r_ajar: bool,
    pub max_acsts: u8,
    pub menu_rq: u8,
    pub preset_cfg: u8,
    pub prkbrkstat: u8,
    pub prnd_stat: u8,
    pub psg_ajar: bool,
    pub psg_ods_stat: u8,
    pub psg_seatbelt: u8,
    pub r_r_ajar: bool,
    pub recirc_stat: u8,
    pub reserved_1: bool,
    pub reserved_2: u8,
    pub reserved_3: u8,
    pub reserved_4: u8,
    pub reserved_5: u8,
    pub rl_heat_stat: u8,
    pub rl_vent_off: bool,
    pub rr_heat_stat: u8,
    pub rr_vent_off: bool,
    pub rt_arw_rst_rq: u8,
    pub s_minus_b: bool,
    pub s_plus_b: bool,
    pub seek: u8,
    pub stw_lvr_stat: u8,
    pub stw_temp: u8,
    pub sync_stat: bool,
    pub tirepressfl: i32,
    pub tirepressfr: i32,
    pub tirepressrr: i32,
    pub tirepressspr: i32,
    pub up_arw_rq: u8,
    pub vc_body_style: u8,
    pub vc_country: u8,
    pub vc_model_year: u8,
    pub vc_veh_line: u8,
    pub vol: u8,
    pub wa: bool,
    pub wh_up: bool,
    pub wprsw6posn: u8,
    pub wprwash_r_sw_posn_v3: u8,
    pub wprwashsw_psd: u8,
}

impl Default for CabinStatus {
    fn default() -> Self {
        let tire = round_to_i32(NOMINAL_TIRE_PRESSURE);
        Self {
            ac_stat: 0,
            acc_mode: false,
            aud_mode_adv: false,
            aus: false,
            auto_stat: 0,
            autodfgstat: 7,
            cell_vr: 0,
            cruise_tgl: false,
            defrost_sel: false,
            dn_arw_step_rq: 0,
            dr_lk_stat: 2,
            ebl_stat: 2,
            engcooltemp: 26,
            engstyle: 7,
            fg_ajar: false,
            fl_hs_stat: 0,
            fl_vs_stat: 0,
            fr_hs_stat: 0,
            fr_vs_stat: 0,
            ft_drv_atc_temp: 72,
            ft_drv_mtc_temp: 127,
            ft_hvac_blw_fn_sp: 0,
            ft_hvac_ctrl_stat: 0,
            ft_hvac_md_stat: 15,
            ft_psg_atc_temp: 72,
            ft_psg_mtc_temp: 127,
            hibmlvr_stat: 0,
            hl_stat: 0,
            hrnsw_psd: false,
            hrnswpsd: false,
            hsw_stat: false,
            l_r_ajar: false,
            max_acsts: 0,
            menu_rq: 0,
            preset_cfg: 0,
            prkbrkstat: 7,
            prnd_stat: 0,
            psg_ajar: false,
            psg_ods_stat: 0,
            psg_seatbelt: 0,
            r_r_ajar: false,
            recirc_stat: 0,
            reserved_1: false,
            reserved_2: 0,
            reserved_3: 0,
            reserved_4: 0,
            reserved_5: 0,
            rl_heat_stat: 0,
            rl_vent_off: false,
            rr_heat_stat: 0,
            rr_vent_off: false,
            rt_arw_rst_rq: 0,
            s_minus_b: false,
            s_plus_b: false,
            seek: 0,
            stw_lvr_stat: 0,
            stw_temp: 20,
            sync_stat: false,
            tirepressfl: tire,
            tirepressfr: tire,
            tirepressrr: tire,
            tirepressspr: tire,
            up_arw_rq: 0,
            vc_body_style: 7,
            vc_country: 2,
            vc_model_year: 225,
            vc_veh_line: 29,
            vol: 0,
            wa: false,
            wh_up: false,
            wprsw6posn: 0,
            wprwash_r_sw_posn_v3: 0,
            wprwashsw_psd: 0,
        }
    }
}

/// Snapshot of every telemetry signal at the end of a tick.
///
/// Field names are the wire names; geofence fields are `null` while no
/// rectangle is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub lat: f64,
    pub lon: f64,
    /// km/h, truncated.
    pub veh_speed: i32,
    pub vehspddisp: i32,
    pub engrpm: i32,
    pub gr: i32,
    /// Kilometers.
    pub odo: i64,
    /// Kilometers.
    pub gas_range: i64,
    /// Liters.
    pub avgfuellvl: i64,
    pub brk_stat: u8,
    pub hazard_status: bool,
    pub turnind_lt_on: bool,
    pub turnind_rt_on: bool,
    pub turnindlvr_stat: u8,
    pub lrw: i32,
    pub tirepressrl: i32,
    pub drv_ajar: bool,
    pub drv_seatbelt: u8,
    pub rr_dr_unlkd: bool,
    pub oil_press: i32,
    pub engoiltemp: i32,
    pub batt_volt: i32,
    pub airtemp_outsd: i32,
    pub veh_int_temp: i32,
    pub wiper: i32,
    pub intensity: i32,
    /// Liters per 100 km.
    pub fuel_consumption: f64,
    pub move_to_rectangle: bool,
    pub in_rectangle: Option<bool>,
    pub rectangle_long0: Option<f64>,
    pub rectangle_lat0: Option<f64>,
    pub rectangle_long1: Option<f64>,
    pub rectangle_lat1: Option<f64>,
    #[serde(flatten)]
    pub cabin: CabinStatus,
}

impl Telemetry {
    /// Render as a single-level JSON object.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_flat_map(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Ok(Map::from_iter([("telemetry".to_string(), other)])),
        }
    }
}
