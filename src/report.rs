use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::scheduler::RouteRecord;
use crate::stats::{FlowReport, LinkReport};

/// Opens `path` for writing, creating missing parent directories.
pub fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

pub fn write_routes<W: Write>(mut writer: W, records: &[RouteRecord]) -> io::Result<()> {
    writeln!(writer, "FlowId,SrcNode,DstNode,HopCount,PathString")?;
    for record in records {
        writeln!(
            writer,
            "{},{},{},{},{}",
            record.flow_id,
            record.src_name,
            record.dst_name,
            record.hop_count(),
            record.path_string()
        )?;
    }
    writer.flush()
}

pub fn write_flows<W: Write>(mut writer: W, reports: &[FlowReport]) -> io::Result<()> {
    writeln!(
        writer,
        "FlowId,SrcAddr,DstAddr,SrcSatellite,DstSatellite,TxPackets,RxPackets,LostPackets,\
         Throughput_Mbps,MeanDelay_ms,MeanJitter_ms,PacketLossRate"
    )?;
    for report in reports {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{:.6},{:.6},{:.6},{:.6}",
            report.flow_id,
            report.source.ip(),
            report.destination.ip(),
            report.src_name,
            report.dst_name,
            report.tx_packets,
            report.rx_packets,
            report.lost_packets,
            report.throughput_mbps,
            report.mean_delay_ms,
            report.mean_jitter_ms,
            report.loss_rate
        )?;
    }
    writer.flush()
}

pub fn write_links<W: Write>(mut writer: W, reports: &[LinkReport]) -> io::Result<()> {
    writeln!(writer, "SrcNode,DstNode,TxPackets,RxPackets,LostPackets,PacketLossRate")?;
    for report in reports {
        writeln!(
            writer,
            "{},{},{},{},{},{:.6}",
            report.src_name,
            report.dst_name,
            report.tx_packets,
            report.rx_packets,
            report.lost_packets,
            report.loss_rate
        )?;
    }
    writer.flush()
}
