// Simulates a 2D cartesian gradient echo of a spherical phantom and prints the
// magnitude of the acquired k-space. Pass a pulseq .seq file as argument to
// simulate that sequence instead.

use std::f64::consts::FRAC_PI_2;

use blochsim::{
    Adc, Block, GradientChannel, RfPulse, Sequence, SimulationOptions, Sphere, TimeRaster,
    TissueParams, Trapezoid, VoxelPhantom,
};

const N: usize = 16;
const FOV: f64 = 0.32;

fn gradient_echo() -> Sequence {
    let raster = TimeRaster::default();
    let mut seq = Sequence::new(raster).unwrap();

    let dwell = 40e-6;
    let delta_k = 1.0 / FOV;
    // Readout amplitude so that one dwell time moves by delta_k
    let readout = delta_k / dwell;
    let pe_time = 1e-3;

    for line in 0..N {
        let ky = (line as f64 - (N / 2) as f64) * delta_k;
        seq.push(Block::rf(RfPulse::block(FRAC_PI_2, 0.0, 1e-4, raster.rf))).unwrap();
        seq.push(
            Block::default()
                .with_gradient(GradientChannel::X, Trapezoid::new(-readout / 2.0, 0.0, N as f64 * dwell, 0.0))
                .with_gradient(GradientChannel::Y, Trapezoid::new(ky / pe_time, 0.0, pe_time, 0.0)),
        ).unwrap();
        seq.push(
            Block::adc(Adc::new(N, dwell, 0.0))
                .with_gradient(GradientChannel::X, Trapezoid::new(readout, 0.0, N as f64 * dwell, 0.0)),
        ).unwrap();
        // Spoil whatever is left
        seq.push(Block::delay(5.0)).unwrap();
    }
    seq
}

fn main() {
    let seq = match std::env::args().nth(1) {
        Some(path) => Sequence::from_pulseq_file(path).unwrap(),
        None => gradient_echo(),
    };

    let spheres = [
        Sphere {
            radius: 0.06,
            params: TissueParams::new(1.0, 2.0, 0.1),
        },
        Sphere {
            radius: 0.12,
            params: TissueParams::new(1.0, 1.0, 0.15),
        },
        Sphere {
            radius: 0.15,
            params: TissueParams::new(1.0, 0.5, 0.25),
        },
    ];
    // Single slice: a 3D grid with one voxel along z is not supported by the
    // builder, so keep only the central plane.
    let volume = VoxelPhantom::spherical(N + 1, FOV, &spheres);
    let phantom = VoxelPhantom::new(
        volume
            .locations()
            .iter()
            .filter(|l| l.position[2].abs() < 1e-9)
            .map(|l| (l.position, l.params)),
    );
    println!("{} isochromats, {} blocks", phantom.len(), seq.len());

    let start = std::time::Instant::now();
    let signal = blochsim::simulate(&seq, &phantom, &SimulationOptions::default()).unwrap();
    println!("Simulation took {} seconds", start.elapsed().as_secs_f32());

    let kspace = signal.to_array().unwrap();
    for row in kspace.rows() {
        let line: Vec<String> = row.iter().map(|s| format!("{:6.1}", s.norm())).collect();
        println!("{}", line.join(" "));
    }
}
